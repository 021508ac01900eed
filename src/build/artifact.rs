//! On-disk artifact store: staging files and content-addressed final names.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{ArtifactFormat, BuildError};
use crate::utils::hash::{ContentHash, hash_file};
use crate::utils::slug::slugify;

/// Hex characters of the content hash kept in a file name.
const HASH_LEN: usize = 16;

#[derive(Debug)]
pub struct ArtifactStore {
    root: PathBuf,
    extension: &'static str,
    counter: u64,
}

impl ArtifactStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            extension: ArtifactFormat::default().extension(),
            counter: 0,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A fresh path for the compiler to write into.
    pub fn staging_path(&mut self) -> Result<PathBuf, BuildError> {
        fs::create_dir_all(&self.root).map_err(|e| BuildError::Io(self.root.clone(), e))?;
        self.counter += 1;
        Ok(self.root.join(format!(
            ".staging-{}-{}.{}",
            std::process::id(),
            self.counter,
            self.extension
        )))
    }

    /// `{family}-{style}_{hash}.otf`. Identical bytes map to the same path.
    pub fn final_path(&self, family: &str, style: &str, hash: ContentHash) -> PathBuf {
        self.root.join(format!(
            "{}-{}_{}.{}",
            slugify(family, ""),
            slugify(style, ""),
            hash.short(HASH_LEN),
            self.extension
        ))
    }

    /// Hash a staged artifact.
    pub fn hash(&self, staging: &Path) -> Result<ContentHash, BuildError> {
        hash_file(staging).map_err(|e| BuildError::Io(staging.to_path_buf(), e))
    }

    /// Move a staged artifact to its final path.
    pub fn promote(&self, staging: &Path, target: &Path) -> Result<(), BuildError> {
        if let Err(e) = fs::rename(staging, target) {
            // Cross-device moves fall back to copy + delete.
            if e.kind() == io::ErrorKind::NotFound {
                return Err(BuildError::Io(staging.to_path_buf(), e));
            }
            fs::copy(staging, target).map_err(|e| BuildError::Io(target.to_path_buf(), e))?;
            discard(staging);
        }
        Ok(())
    }

    /// Leftover staging files from an interrupted run.
    pub fn sweep_staging(&self) -> usize {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return 0;
        };
        entries
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().starts_with(".staging-"))
            .filter(|e| fs::remove_file(e.path()).is_ok())
            .count()
    }
}

/// Delete a staging file; a missing file is fine.
pub fn discard(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => crate::debug!("install"; "could not remove {}: {}", path.display(), e),
    }
}
