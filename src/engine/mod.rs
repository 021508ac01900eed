//! The auto-install engine: one logical actor over the watch set, the
//! debounce timer and the build orchestrator.
//!
//! ```text
//! paths changed ──▶ mark dirty ──▶ arm timer ─ ─ quiet period ─ ─▶ poll ──▶ batch
//! activity      ──▶ reset timer (only while armed)
//! save / open   ──▶ immediate rebuild of one source (timer untouched)
//! resign active ──▶ cancel timer ──▶ batch now
//! ```
//!
//! Every method takes the current `Instant`, so nothing here sleeps.


use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::build::{BatchReport, Orchestrator};
use crate::compat::CompatResolver;
use crate::core::{SourceId, SourceKind};
use crate::registry::InstallRecord;
use crate::schedule::{Activity, DebounceTimer, SchedulerObserver};
use crate::ufo::DesignSpace;
use crate::utils::plural::plural_count;
use crate::watch::{Mutation, SelfWrites, WatchSet, WatchState, classify};

/// Runtime policy, taken from `[schedule]` and `[install]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Quiet period. Zero means manual rebuilds only.
    pub quiet: Duration,
    pub install_after_save: bool,
    pub install_after_app_exit: bool,
    pub uninstall_on_exit: bool,
    pub prune_orphans: bool,
    pub compat_threshold: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quiet: Duration::from_secs(5),
            install_after_save: false,
            install_after_app_exit: true,
            uninstall_on_exit: true,
            prune_orphans: true,
            compat_threshold: crate::compat::DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStatus {
    pub path: SourceId,
    pub kind: SourceKind,
    pub state: WatchState,
    pub artifacts: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerStatus {
    pub armed: bool,
    pub remaining_secs: Option<u64>,
    pub quiet_secs: u64,
}

/// Snapshot served by `GET /status`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub sources: Vec<SourceStatus>,
    pub timer: TimerStatus,
    pub queued: Vec<SourceId>,
    pub installed: Vec<InstallRecord>,
    pub cycles: u64,
}

pub struct AutoInstaller {
    watch: WatchSet,
    timer: DebounceTimer,
    orchestrator: Orchestrator,
    self_writes: SelfWrites,
    settings: Settings,
    /// Batches run since start.
    cycles: u64,
}

impl AutoInstaller {
    pub fn new(mut orchestrator: Orchestrator, settings: Settings) -> Self {
        orchestrator.set_resolver(CompatResolver::new(settings.compat_threshold));
        Self {
            watch: WatchSet::new(),
            timer: DebounceTimer::new(settings.quiet),
            orchestrator,
            self_writes: SelfWrites::new(),
            settings,
            cycles: 0,
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn SchedulerObserver>) -> Self {
        self.timer.add_observer(observer);
        self
    }

    pub fn watch(&self) -> &WatchSet {
        &self.watch
    }

    pub fn timer(&self) -> &DebounceTimer {
        &self.timer
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Paths the filesystem watcher must cover.
    pub fn watch_roots(&self) -> Vec<PathBuf> {
        self.watch.watch_roots()
    }

    /// How long the driving loop may sleep.
    pub fn sleep_duration(&self, now: Instant) -> Duration {
        self.timer.sleep_duration(now)
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Enable every configured source, prune orphaned installs and build
    /// everything once.
    pub fn startup(&mut self, sources: &[PathBuf]) -> BatchReport {
        let swept = self.orchestrator.sweep_staging();
        if swept > 0 {
            crate::debug!("install"; "removed {}", plural_count(swept, "staging file"));
        }

        for path in sources {
            if let Some(id) = self.register(path) {
                self.watch.enable(&id);
                self.watch.mark_dirty(&id);
            }
        }

        if self.settings.prune_orphans {
            let watched: BTreeSet<SourceId> = self.watch.enabled().map(|s| s.id.clone()).collect();
            let pruned = self.orchestrator.prune_orphans(&watched);
            if pruned > 0 {
                crate::log!("install"; "pruned {}", plural_count(pruned, "orphaned install"));
            }
        }

        self.run_batch()
    }

    /// Cancel the pending timer and, if configured, retire everything.
    pub fn shutdown(&mut self) -> usize {
        self.timer.cancel();
        if !self.settings.uninstall_on_exit {
            return 0;
        }
        let retired = self.orchestrator.teardown_all();
        if retired > 0 {
            crate::log!("install"; "uninstalled {}", plural_count(retired, "artifact"));
        }
        retired
    }

    /// Apply reloaded settings. A pending timer restarts with the new delay.
    pub fn apply_settings(&mut self, settings: Settings, now: Instant) {
        self.timer.set_quiet(settings.quiet, now);
        self.orchestrator
            .set_resolver(CompatResolver::new(settings.compat_threshold));
        self.settings = settings;
    }

    // ------------------------------------------------------------------------
    // Host signals
    // ------------------------------------------------------------------------

    /// Filesystem changes. Returns how many sources became dirty.
    pub fn on_paths_changed(&mut self, paths: &[PathBuf], now: Instant) -> usize {
        let mut touched: Vec<SourceId> = Vec::new();
        let mut documents: Vec<SourceId> = Vec::new();

        for path in paths {
            let writer = self.self_writes.writer_of(path);
            for (id, root) in self.watch.owners_of(path) {
                if writer.as_ref() == Some(id) {
                    crate::debug!("watch"; "{}: ignoring own write {}", id.file_name(), path.display());
                    continue;
                }
                let Some(mutation) = classify(root, path) else {
                    continue;
                };
                crate::debug!("watch"; "{}: {} changed", id.file_name(), mutation.label());
                if mutation == Mutation::Document {
                    documents.push(id.clone());
                }
                if !touched.contains(id) {
                    touched.push(id.clone());
                }
            }
        }

        // The master list may have changed.
        for id in &documents {
            let roots = roots_for(id, SourceKind::DesignSpace);
            self.watch.register(id.clone(), SourceKind::DesignSpace, roots);
        }

        let dirtied = touched
            .iter()
            .filter(|id| self.watch.mark_dirty(id))
            .count();
        if dirtied > 0 {
            self.timer.arm(now);
        }
        dirtied
    }

    /// Generic editing activity: extends a pending quiet period.
    pub fn on_activity(&mut self, activity: Activity, now: Instant) -> bool {
        let reset = self.timer.reset_if_armed(now);
        if reset {
            crate::debug!("schedule"; "{} reset the timer", activity);
        }
        reset
    }

    /// A document was saved. With `install_after_save` the source is rebuilt
    /// now, leaving the shared timer alone.
    pub fn on_saved(&mut self, path: &Path) -> Option<BatchReport> {
        if !self.settings.install_after_save {
            return None;
        }
        let id = SourceId::new(path);
        if !self.watch.get(&id).is_some_and(|s| s.is_enabled()) {
            return None;
        }
        Some(self.rebuild(&[id]))
    }

    /// A document was opened. Known enabled sources rebuild immediately;
    /// unknown ones become known but stay disabled.
    pub fn on_opened(&mut self, path: &Path) -> Option<BatchReport> {
        let id = SourceId::new(path);
        match self.watch.get(&id) {
            Some(source) if source.is_enabled() => Some(self.rebuild(&[id])),
            Some(_) => None,
            None => {
                self.register(path);
                None
            }
        }
    }

    /// A document was closed: tear down and forget it.
    pub fn on_closed(&mut self, path: &Path) -> usize {
        let id = SourceId::new(path);
        let retired = self.orchestrator.teardown(&id);
        if let Some(source) = self.watch.remove(&id) {
            for root in &source.roots {
                self.self_writes.forget_under(root);
            }
        }
        self.cancel_if_idle();
        retired
    }

    /// The host is about to go inactive: skip the wait if anything is dirty.
    pub fn on_resign_active(&mut self) -> Option<BatchReport> {
        if !self.settings.install_after_app_exit || !self.watch.any_dirty() {
            return None;
        }
        self.timer.cancel();
        Some(self.run_batch())
    }

    // ------------------------------------------------------------------------
    // User commands
    // ------------------------------------------------------------------------

    /// Opt a source in and install it immediately.
    pub fn enable(&mut self, path: &Path) -> Option<BatchReport> {
        let id = self.register(path)?;
        if !self.watch.enable(&id) {
            return None;
        }
        crate::log!("watch"; "watching {}", id.file_name());
        Some(self.rebuild(&[id]))
    }

    /// Opt a source out. Its artifacts are retired synchronously.
    pub fn disable(&mut self, path: &Path) -> usize {
        let id = SourceId::new(path);
        if !self.watch.disable(&id) {
            return 0;
        }
        if let Some(source) = self.watch.get(&id) {
            for root in &source.roots {
                self.self_writes.forget_under(root);
            }
        }
        crate::log!("watch"; "stopped watching {}", id.file_name());
        let retired = self.orchestrator.teardown(&id);
        self.cancel_if_idle();
        retired
    }

    /// Include a design space in the next batch and start the quiet period.
    pub fn queue(&mut self, path: &Path, now: Instant) -> bool {
        let id = SourceId::new(path);
        if SourceKind::from_path(id.path()) != Some(SourceKind::DesignSpace) {
            return false;
        }
        self.register(path);
        self.orchestrator.queue_designspace(id);
        self.timer.arm(now);
        true
    }

    /// Forced rebuild of the given sources, or of every enabled source when
    /// none are given. The pending cycle is cancelled first and restarted
    /// when other sources still wait for it.
    pub fn reinstall(&mut self, paths: &[PathBuf], now: Instant) -> BatchReport {
        self.timer.cancel();
        let ids: Vec<SourceId> = if paths.is_empty() {
            self.watch.enabled().map(|s| s.id.clone()).collect()
        } else {
            paths.iter().map(SourceId::new).collect()
        };
        let report = self.rebuild(&ids);
        if self.has_pending_besides(&ids) {
            self.timer.arm(now);
        }
        report
    }

    /// Advance the timer; runs the batch when it fires.
    pub fn poll(&mut self, now: Instant) -> Option<BatchReport> {
        self.timer.poll(now).then(|| self.run_batch())
    }

    pub fn status(&self, now: Instant) -> Status {
        let registry = self.orchestrator.registry();
        Status {
            sources: self
                .watch
                .iter()
                .map(|s| SourceStatus {
                    path: s.id.clone(),
                    kind: s.kind,
                    state: s.state(),
                    artifacts: registry.records_of(&s.id).len(),
                })
                .collect(),
            timer: TimerStatus {
                armed: self.timer.is_armed(),
                remaining_secs: self.timer.countdown(now),
                quiet_secs: self.timer.quiet().as_secs(),
            },
            queued: self.orchestrator.queued().cloned().collect(),
            installed: registry.records().cloned().collect(),
            cycles: self.cycles,
        }
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    /// Make a path known (disabled). `None` if it is not a font source.
    fn register(&mut self, path: &Path) -> Option<SourceId> {
        let id = SourceId::new(path);
        let Some(kind) = SourceKind::from_path(id.path()) else {
            crate::log!("watch"; "{} is not a font source", path.display());
            return None;
        };
        let roots = roots_for(&id, kind);
        self.watch.register(id.clone(), kind, roots);
        Some(id)
    }

    /// Nothing left to build: a pending cycle would be empty.
    fn cancel_if_idle(&mut self) {
        if !self.watch.any_dirty() && self.orchestrator.queued().next().is_none() {
            self.timer.cancel();
        }
    }

    /// Dirty or queued sources outside `ids`.
    fn has_pending_besides(&self, ids: &[SourceId]) -> bool {
        let dirty = [SourceKind::Font, SourceKind::DesignSpace]
            .into_iter()
            .flat_map(|kind| self.watch.dirty(kind));
        let queued = self.orchestrator.queued().cloned();
        dirty.chain(queued).any(|id| !ids.contains(&id))
    }

    fn run_batch(&mut self) -> BatchReport {
        let report = self.orchestrator.rebuild_batch(&mut self.watch);
        self.finish(report)
    }

    fn rebuild(&mut self, ids: &[SourceId]) -> BatchReport {
        let report = self.orchestrator.rebuild_now(ids, &mut self.watch);
        self.finish(report)
    }

    fn finish(&mut self, report: BatchReport) -> BatchReport {
        if report.is_empty() {
            return report;
        }
        self.cycles += 1;
        for (writer, correction) in &report.corrections {
            self.self_writes
                .record(correction.path.clone(), correction.hash, writer.clone());
        }

        if report.is_success() {
            crate::logger::status_success(&report.summary());
        } else if let Some((id, message)) = report.failed.first() {
            crate::logger::status_error(&format!("{} failed", id.file_name()), message);
        } else if let Some((id, glyphs)) = report.aborted.first() {
            crate::logger::status_error(
                &format!("{} not compatible", id.file_name()),
                &glyphs.join(", "),
            );
        }
        report
    }
}

/// What to watch for a source: the UFO itself, or the document plus every
/// master it references.
fn roots_for(id: &SourceId, kind: SourceKind) -> Vec<PathBuf> {
    let mut roots = vec![id.path().to_path_buf()];
    if kind == SourceKind::DesignSpace {
        match DesignSpace::open(id.path()) {
            Ok(ds) => roots.extend(ds.master_paths()),
            Err(e) => crate::debug!("watch"; "{}: {}", id.file_name(), e),
        }
    }
    roots
}
