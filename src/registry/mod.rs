//! Install registry: the single authority on which artifacts are live.
//!
//! Records are keyed by artifact path. Two indexes sit on top:
//!
//! - `by_source`: a font source's one live artifact (primary identity)
//! - `by_name`: display name → artifacts, the fallback when the identity
//!   used at install time is gone. Distinct sources sharing a display name
//!   collide here; the first record wins. This is a known limitation.
//!
//! Design spaces own a *set* of artifacts (`designspaces`).
//!
//! The registry never orders operations itself: callers retire the old
//! artifact before recording a new one for the same source.

mod persist;


use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::build::ArtifactInstaller;
use crate::core::SourceId;

pub use persist::{persist_records, restore_records};

/// One installed artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallRecord {
    pub artifact_path: PathBuf,
    pub name: String,
    /// Font source that produced it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceId>,
    /// Design space that produced it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designspace: Option<SourceId>,
}

impl InstallRecord {
    /// Whichever source owns this record.
    pub fn owner(&self) -> Option<&SourceId> {
        self.source.as_ref().or(self.designspace.as_ref())
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    records: BTreeMap<PathBuf, InstallRecord>,
    by_source: FxHashMap<SourceId, PathBuf>,
    by_name: FxHashMap<String, Vec<PathBuf>>,
    designspaces: BTreeMap<SourceId, BTreeSet<PathBuf>>,
    state_file: Option<PathBuf>,
}

impl Registry {
    /// In-memory registry (nothing is persisted).
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry backed by a state file, loading any records it holds.
    pub fn open(state_file: &Path) -> io::Result<Self> {
        let mut registry = Self {
            state_file: Some(state_file.to_path_buf()),
            ..Self::default()
        };
        for record in restore_records(state_file)? {
            registry.insert(record);
        }
        Ok(registry)
    }

    pub fn state_file(&self) -> Option<&Path> {
        self.state_file.as_deref()
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn lookup(&self, id: &SourceId) -> Option<&InstallRecord> {
        self.by_source.get(id).and_then(|path| self.records.get(path))
    }

    /// Fallback lookup by the name used at install time.
    pub fn lookup_by_display_name(&self, name: &str) -> Option<&InstallRecord> {
        self.by_name
            .get(name)
            .and_then(|paths| paths.first())
            .and_then(|path| self.records.get(path))
    }

    /// Primary identity first, then the display name.
    pub fn find(&self, id: &SourceId, name: &str) -> Option<&InstallRecord> {
        self.lookup(id).or_else(|| {
            self.lookup_by_display_name(name)
                .filter(|record| record.designspace.is_none())
        })
    }

    pub fn get(&self, artifact: &Path) -> Option<&InstallRecord> {
        self.records.get(artifact)
    }

    /// Artifact set produced by a design space (empty if none).
    pub fn designspace_set(&self, id: &SourceId) -> BTreeSet<PathBuf> {
        self.designspaces.get(id).cloned().unwrap_or_default()
    }

    pub fn records(&self) -> impl Iterator<Item = &InstallRecord> {
        self.records.values()
    }

    /// Every record owned by `id`, font or design space.
    pub fn records_of(&self, id: &SourceId) -> Vec<&InstallRecord> {
        self.records
            .values()
            .filter(|r| r.owner() == Some(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // ------------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------------

    /// Upsert the live artifact of a font source.
    ///
    /// Any prior record for `source` must already be retired.
    pub fn record_install(&mut self, source: Option<&SourceId>, artifact: &Path, name: &str) {
        if let Some(id) = source
            && let Some(previous) = self.by_source.get(id).cloned()
            && previous != artifact
        {
            crate::debug!("install"; "replacing unretired record {}", previous.display());
            self.remove(&previous);
        }
        self.insert(InstallRecord {
            artifact_path: artifact.to_path_buf(),
            name: name.to_owned(),
            source: source.cloned(),
            designspace: None,
        });
        self.save();
    }

    /// Add one artifact to a design space's produced set.
    pub fn record_designspace_install(&mut self, designspace: &SourceId, artifact: &Path, name: &str) {
        self.insert(InstallRecord {
            artifact_path: artifact.to_path_buf(),
            name: name.to_owned(),
            source: None,
            designspace: Some(designspace.clone()),
        });
        self.save();
    }

    /// Retire the live artifact of a font source.
    pub fn retire(
        &mut self,
        id: &SourceId,
        installer: &mut dyn ArtifactInstaller,
    ) -> Option<InstallRecord> {
        let path = self.by_source.get(id)?.clone();
        self.retire_artifact(&path, installer)
    }

    /// Unregister, delete the file (best effort) and drop the record.
    pub fn retire_artifact(
        &mut self,
        artifact: &Path,
        installer: &mut dyn ArtifactInstaller,
    ) -> Option<InstallRecord> {
        installer.uninstall(artifact);
        delete_artifact(artifact);
        let record = self.remove(artifact);
        self.save();
        record
    }

    /// Retire every artifact a design space produced.
    pub fn retire_designspace(
        &mut self,
        id: &SourceId,
        installer: &mut dyn ArtifactInstaller,
    ) -> Vec<InstallRecord> {
        self.designspace_set(id)
            .into_iter()
            .filter_map(|path| self.retire_artifact(&path, installer))
            .collect()
    }

    /// Retire everything owned by `id`, whatever its kind.
    pub fn retire_all_of(
        &mut self,
        id: &SourceId,
        installer: &mut dyn ArtifactInstaller,
    ) -> Vec<InstallRecord> {
        let mut retired = self.retire_designspace(id, installer);
        retired.extend(self.retire(id, installer));
        retired
    }

    /// Retire every artifact. Returns how many were retired.
    pub fn retire_everything(&mut self, installer: &mut dyn ArtifactInstaller) -> usize {
        let paths: Vec<_> = self.records.keys().cloned().collect();
        paths
            .iter()
            .filter(|path| self.retire_artifact(path, installer).is_some())
            .count()
    }

    /// Retire records that `keep` rejects or whose file is gone.
    pub fn prune(
        &mut self,
        installer: &mut dyn ArtifactInstaller,
        mut keep: impl FnMut(&InstallRecord) -> bool,
    ) -> Vec<InstallRecord> {
        let doomed: Vec<_> = self
            .records
            .values()
            .filter(|r| !r.artifact_path.exists() || !keep(r))
            .map(|r| r.artifact_path.clone())
            .collect();
        doomed
            .iter()
            .filter_map(|path| self.retire_artifact(path, installer))
            .collect()
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn insert(&mut self, record: InstallRecord) {
        let path = record.artifact_path.clone();
        self.remove(&path);

        if let Some(id) = &record.source {
            self.by_source.insert(id.clone(), path.clone());
        }
        if let Some(ds) = &record.designspace {
            self.designspaces
                .entry(ds.clone())
                .or_default()
                .insert(path.clone());
        }
        self.by_name
            .entry(record.name.clone())
            .or_default()
            .push(path.clone());
        self.records.insert(path, record);
    }

    fn remove(&mut self, artifact: &Path) -> Option<InstallRecord> {
        let record = self.records.remove(artifact)?;

        if let Some(id) = &record.source
            && self.by_source.get(id).is_some_and(|p| p == artifact)
        {
            self.by_source.remove(id);
        }
        if let Some(ds) = &record.designspace
            && let Some(set) = self.designspaces.get_mut(ds)
        {
            set.remove(artifact);
            if set.is_empty() {
                self.designspaces.remove(ds);
            }
        }
        if let Some(paths) = self.by_name.get_mut(&record.name) {
            paths.retain(|p| p != artifact);
            if paths.is_empty() {
                self.by_name.remove(&record.name);
            }
        }
        Some(record)
    }

    fn save(&self) {
        let Some(path) = &self.state_file else {
            return;
        };
        if let Err(e) = persist_records(self.records.values(), path) {
            crate::log!("error"; "failed to save install state {}: {}", path.display(), e);
        }
    }
}

/// Delete an artifact file; a missing file is fine.
fn delete_artifact(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => crate::debug!("install"; "deleted {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => crate::log!("install"; "could not delete {}: {}", path.display(), e),
    }
}
