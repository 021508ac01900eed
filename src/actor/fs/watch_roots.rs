use std::path::PathBuf;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

/// Watch-root consistency manager.
///
/// Responsibility:
/// - Attach existing roots at startup
/// - Follow the engine's root set as sources come and go
/// - Re-attach roots that were removed and recreated
pub(super) struct WatchRoots {
    desired: Vec<PathBuf>,
    attached: FxHashSet<PathBuf>,
}

impl WatchRoots {
    pub(super) fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            desired: paths,
            attached: FxHashSet::default(),
        }
    }

    pub(super) fn attach_existing(
        &mut self,
        watcher: &mut RecommendedWatcher,
    ) -> notify::Result<()> {
        for path in &self.desired {
            if !path.exists() {
                continue;
            }
            watcher.watch(path, RecursiveMode::Recursive)?;
            self.attached.insert(path.clone());
        }

        Ok(())
    }

    /// Replace the desired roots, detaching the ones that are gone.
    /// New roots are attached by the next `maintain`.
    pub(super) fn set_desired(&mut self, paths: Vec<PathBuf>, watcher: &mut RecommendedWatcher) {
        let stale: Vec<_> = self
            .attached
            .iter()
            .filter(|path| !paths.contains(path))
            .cloned()
            .collect();
        for path in stale {
            // The root may already be gone, in which case notify dropped it.
            let _ = watcher.unwatch(&path);
            self.attached.remove(&path);
            crate::debug!("watch"; "detached: {}", path.display());
        }
        self.desired = paths;
        self.maintain(watcher);
    }

    pub(super) fn maintain(&mut self, watcher: &mut RecommendedWatcher) {
        // Drop stale handles for roots that no longer exist.
        self.attached.retain(|path| path.exists());

        for path in &self.desired {
            if self.attached.contains(path) || !path.exists() {
                continue;
            }

            if watcher.watch(path, RecursiveMode::Recursive).is_ok() {
                self.attached.insert(path.clone());
                crate::debug!("watch"; "attached: {}", path.display());
            }
        }
    }

    #[cfg(test)]
    pub(super) fn attached(&self) -> &FxHashSet<PathBuf> {
        &self.attached
    }
}
