//! Watch set: per-source enable and dirty flags.
//!
//! ```text
//! Unwatched ──enable──▶ Clean ──mutation──▶ Dirty
//!     ▲                  ▲  │                 │
//!     └───disable/close──┘  └◀──rebuilt───────┘
//! ```
//!
//! Disabling always clears dirtiness, so a source that is re-enabled later
//! starts clean.

mod change;


use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::{SourceId, SourceKind};

pub use change::{Mutation, SelfWrites, classify};

/// Observable state of one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchState {
    Unwatched,
    Clean,
    Dirty,
}

#[derive(Debug, Clone, Serialize)]
pub struct WatchedSource {
    pub id: SourceId,
    pub kind: SourceKind,
    enabled: bool,
    dirty: bool,
    /// Paths whose changes belong to this source.
    pub roots: Vec<PathBuf>,
}

impl WatchedSource {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[cfg(test)]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn state(&self) -> WatchState {
        match (self.enabled, self.dirty) {
            (false, _) => WatchState::Unwatched,
            (true, false) => WatchState::Clean,
            (true, true) => WatchState::Dirty,
        }
    }
}

/// Every source this process knows about, enabled or not.
#[derive(Debug, Default)]
pub struct WatchSet {
    sources: BTreeMap<SourceId, WatchedSource>,
}

impl WatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a source known without watching it. Returns `false` if it
    /// already was known (its roots are refreshed either way).
    pub fn register(&mut self, id: SourceId, kind: SourceKind, roots: Vec<PathBuf>) -> bool {
        if let Some(existing) = self.sources.get_mut(&id) {
            existing.roots = roots;
            return false;
        }
        self.sources.insert(
            id.clone(),
            WatchedSource {
                id,
                kind,
                enabled: false,
                dirty: false,
                roots,
            },
        );
        true
    }

    /// `Unwatched → Clean`. Returns `false` for unknown or already enabled
    /// sources.
    pub fn enable(&mut self, id: &SourceId) -> bool {
        match self.sources.get_mut(id) {
            Some(source) if !source.enabled => {
                source.enabled = true;
                source.dirty = false;
                true
            }
            _ => false,
        }
    }

    /// `→ Unwatched`, clearing dirtiness. Returns `false` if nothing changed.
    pub fn disable(&mut self, id: &SourceId) -> bool {
        match self.sources.get_mut(id) {
            Some(source) if source.enabled => {
                source.enabled = false;
                source.dirty = false;
                true
            }
            _ => false,
        }
    }

    /// Record a mutation. Only watched sources become dirty; the return value
    /// tells whether the scheduler should be armed.
    pub fn mark_dirty(&mut self, id: &SourceId) -> bool {
        match self.sources.get_mut(id) {
            Some(source) if source.enabled => {
                source.dirty = true;
                true
            }
            _ => false,
        }
    }

    /// `Dirty → Clean` after a successful rebuild.
    pub fn mark_clean(&mut self, id: &SourceId) {
        if let Some(source) = self.sources.get_mut(id) {
            source.dirty = false;
        }
    }

    /// Forget a source entirely.
    pub fn remove(&mut self, id: &SourceId) -> Option<WatchedSource> {
        self.sources.remove(id)
    }

    pub fn get(&self, id: &SourceId) -> Option<&WatchedSource> {
        self.sources.get(id)
    }

    pub fn contains(&self, id: &SourceId) -> bool {
        self.sources.contains_key(id)
    }

    pub fn state(&self, id: &SourceId) -> WatchState {
        self.sources
            .get(id)
            .map_or(WatchState::Unwatched, WatchedSource::state)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WatchedSource> {
        self.sources.values()
    }

    pub fn enabled(&self) -> impl Iterator<Item = &WatchedSource> {
        self.sources.values().filter(|s| s.enabled)
    }

    /// Enabled and dirty sources of `kind`, in id order.
    pub fn dirty(&self, kind: SourceKind) -> Vec<SourceId> {
        self.enabled()
            .filter(|s| s.dirty && s.kind == kind)
            .map(|s| s.id.clone())
            .collect()
    }

    pub fn any_dirty(&self) -> bool {
        self.enabled().any(|s| s.dirty)
    }

    /// Enabled sources with a root containing `path`, with the matching root.
    pub fn owners_of<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = (&'a SourceId, &'a Path)> {
        self.enabled().filter_map(move |source| {
            source
                .roots
                .iter()
                .find(|root| path.starts_with(root))
                .map(|root| (&source.id, root.as_path()))
        })
    }

    /// Union of the roots of all enabled sources, sorted and deduplicated.
    pub fn watch_roots(&self) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = self
            .enabled()
            .flat_map(|s| s.roots.iter().cloned())
            .collect();
        roots.sort();
        roots.dedup();
        roots
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
