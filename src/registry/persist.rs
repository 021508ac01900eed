//! Installed-artifact state file.
//!
//! `{ "<artifactPath>": { "artifactPath": ..., "name": ..., "source": ... } }`

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::InstallRecord;

/// Check if file content is the same as new content
fn file_content_matches(path: &Path, content: &str) -> bool {
    path.exists() && fs::read_to_string(path).is_ok_and(|existing| existing == content)
}

/// Write the state file, skipping the write when nothing changed.
pub fn persist_records<'a>(
    records: impl Iterator<Item = &'a InstallRecord>,
    path: &Path,
) -> std::io::Result<()> {
    let map: BTreeMap<&Path, &InstallRecord> =
        records.map(|r| (r.artifact_path.as_path(), r)).collect();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(&map)?;

    if file_content_matches(path, &json) {
        crate::debug!("install"; "state unchanged, skipping write");
        return Ok(());
    }

    fs::write(path, &json)?;
    crate::debug!("install"; "saved {} install record(s)", map.len());
    Ok(())
}

/// Read the state file. A missing file is an empty state.
pub fn restore_records(path: &Path) -> std::io::Result<Vec<InstallRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let json = fs::read_to_string(path)?;
    let map: BTreeMap<PathBuf, InstallRecord> = serde_json::from_str(&json)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    crate::debug!("install"; "restored {} install record(s)", map.len());
    Ok(map.into_values().collect())
}
