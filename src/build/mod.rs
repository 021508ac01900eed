//! Build orchestrator: dirty sources in, live artifacts out.
//!
//! ```text
//! font:         generate ─▶ retire old ─▶ install new ─▶ record
//! design space: resolve ─▶ generate all ─▶ retire dropped ─▶ install added ─▶ record
//! ```
//!
//! Generation always happens before retirement, so a failed compile leaves
//! the previous artifact live. Unchanged artifacts (same content, same
//! path) are retained without touching the installer.

mod artifact;
mod error;
mod generator;
mod installer;
mod progress;

#[cfg(test)]
pub(crate) mod testing;

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::compat::{CompatResolver, Correction};
use crate::core::{SourceId, SourceKind};
use crate::registry::Registry;
use crate::ufo::{DesignSpace, UfoFont};
use crate::watch::WatchSet;

pub use artifact::{ArtifactStore, discard};
pub use error::{BuildError, GenerateError};
pub use generator::{
    ArtifactFormat, ArtifactGenerator, CommandGenerator, GenerateOptions, GenerateTarget,
};
pub use installer::{ArtifactInstaller, FontDirInstaller, InstallReport};
pub use progress::{DESIGNSPACE_STEPS, FONT_STEPS, NoProgress, Progress, TerminalProgress};

/// What one successful source rebuild did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutcome {
    pub installed: usize,
    pub retained: usize,
    pub retired: usize,
    pub corrections: Vec<Correction>,
}

/// Summary of a batch. Failures are collected, never raised.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub built: Vec<SourceId>,
    pub installed: usize,
    pub retained: usize,
    pub retired: usize,
    pub failed: Vec<(SourceId, String)>,
    pub aborted: Vec<(SourceId, Vec<String>)>,
    /// Glyph files rewritten by the compatibility pass, with the design
    /// space that rewrote them.
    pub corrections: Vec<(SourceId, Correction)>,
}

impl BatchReport {
    pub fn is_empty(&self) -> bool {
        self.built.is_empty() && self.failed.is_empty() && self.aborted.is_empty()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.aborted.is_empty()
    }

    pub fn summary(&self) -> String {
        let mut parts = vec![format!("{} installed", self.installed)];
        if self.retained > 0 {
            parts.push(format!("{} unchanged", self.retained));
        }
        if self.retired > 0 {
            parts.push(format!("{} retired", self.retired));
        }
        if !self.failed.is_empty() {
            parts.push(format!("{} failed", self.failed.len()));
        }
        if !self.aborted.is_empty() {
            parts.push(format!("{} aborted", self.aborted.len()));
        }
        parts.join(", ")
    }

    fn record(&mut self, id: &SourceId, outcome: BuildOutcome) {
        self.built.push(id.clone());
        self.installed += outcome.installed;
        self.retained += outcome.retained;
        self.retired += outcome.retired;
        self.corrections
            .extend(outcome.corrections.into_iter().map(|c| (id.clone(), c)));
    }
}

/// A compiled artifact waiting in the staging area.
struct Staged {
    staging: PathBuf,
    target: PathBuf,
    name: String,
}

/// One thing to compile, with the names used for its artifact.
struct Job {
    target: GenerateTarget,
    family: String,
    style: String,
    options: GenerateOptions,
}

pub struct Orchestrator {
    generator: Box<dyn ArtifactGenerator>,
    installer: Box<dyn ArtifactInstaller>,
    registry: Registry,
    resolver: CompatResolver,
    store: ArtifactStore,
    progress: Box<dyn Progress>,
    /// Design spaces explicitly queued for the next batch.
    queued: BTreeSet<SourceId>,
    item_steps: usize,
}

impl Orchestrator {
    pub fn new(
        generator: Box<dyn ArtifactGenerator>,
        installer: Box<dyn ArtifactInstaller>,
        registry: Registry,
        resolver: CompatResolver,
        store: ArtifactStore,
    ) -> Self {
        Self {
            generator,
            installer,
            registry,
            resolver,
            store,
            progress: Box::new(NoProgress),
            queued: BTreeSet::new(),
            item_steps: 0,
        }
    }

    pub fn with_progress(mut self, progress: Box<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn resolver(&self) -> &CompatResolver {
        &self.resolver
    }

    pub fn set_resolver(&mut self, resolver: CompatResolver) {
        self.resolver = resolver;
    }

    pub fn queued(&self) -> impl Iterator<Item = &SourceId> {
        self.queued.iter()
    }

    /// Include a design space in the next batch regardless of dirtiness.
    pub fn queue_designspace(&mut self, id: SourceId) {
        self.queued.insert(id);
    }

    // ------------------------------------------------------------------------
    // Batches
    // ------------------------------------------------------------------------

    /// Rebuild every enabled dirty source plus the queued design spaces.
    pub fn rebuild_batch(&mut self, watch: &mut WatchSet) -> BatchReport {
        let fonts = watch.dirty(SourceKind::Font);
        let mut designspaces: BTreeSet<SourceId> =
            watch.dirty(SourceKind::DesignSpace).into_iter().collect();
        let queued = std::mem::take(&mut self.queued);
        designspaces.extend(queued.iter().cloned());
        let designspaces: Vec<_> = designspaces.into_iter().collect();
        let report = self.run(&fonts, &designspaces, watch);
        self.requeue_unfinished(&report, &queued);
        report
    }

    /// Rebuild the named sources, dirty or not.
    pub fn rebuild_now(&mut self, ids: &[SourceId], watch: &mut WatchSet) -> BatchReport {
        let mut fonts = Vec::new();
        let mut designspaces = Vec::new();
        let mut queued = BTreeSet::new();
        for id in ids {
            let kind = watch
                .get(id)
                .map(|s| s.kind)
                .or_else(|| SourceKind::from_path(id.path()));
            match kind {
                Some(SourceKind::Font) => fonts.push(id.clone()),
                Some(SourceKind::DesignSpace) => {
                    if self.queued.remove(id) {
                        queued.insert(id.clone());
                    }
                    designspaces.push(id.clone());
                }
                None => crate::log!("install"; "skipping {}: not a font source", id),
            }
        }
        let report = self.run(&fonts, &designspaces, watch);
        self.requeue_unfinished(&report, &queued);
        report
    }

    /// Queued design spaces that failed or aborted stay queued for the next
    /// batch; enabled ones stay dirty on their own.
    fn requeue_unfinished(&mut self, report: &BatchReport, queued: &BTreeSet<SourceId>) {
        let unfinished = report
            .failed
            .iter()
            .map(|(id, _)| id)
            .chain(report.aborted.iter().map(|(id, _)| id));
        for id in unfinished {
            if queued.contains(id) {
                self.queued.insert(id.clone());
            }
        }
    }

    fn run(
        &mut self,
        fonts: &[SourceId],
        designspaces: &[SourceId],
        watch: &mut WatchSet,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        if fonts.is_empty() && designspaces.is_empty() {
            return report;
        }

        self.progress
            .begin(fonts.len() * FONT_STEPS + designspaces.len() * DESIGNSPACE_STEPS);

        for id in fonts {
            self.item_steps = 0;
            match self.build_font(id) {
                Ok(outcome) => {
                    watch.mark_clean(id);
                    report.record(id, outcome);
                }
                Err(e) => {
                    crate::log!("error"; "{}: {}", id, e);
                    report.failed.push((id.clone(), e.to_string()));
                }
            }
            self.complete_item(FONT_STEPS);
        }

        for id in designspaces {
            self.item_steps = 0;
            match self.build_designspace(id) {
                Ok(outcome) => {
                    watch.mark_clean(id);
                    report.record(id, outcome);
                }
                Err(BuildError::Unresolvable { glyphs }) => {
                    crate::log!("compat"; "{}: build aborted, unresolvable glyphs:", id);
                    for glyph in &glyphs {
                        crate::log!("compat"; "  {}", glyph);
                    }
                    report.aborted.push((id.clone(), glyphs));
                }
                Err(e) => {
                    crate::log!("error"; "{}: {}", id, e);
                    report.failed.push((id.clone(), e.to_string()));
                }
            }
            self.complete_item(DESIGNSPACE_STEPS);
        }

        self.progress.finish();
        report
    }

    fn step(&mut self) {
        self.item_steps += 1;
        self.progress.step();
    }

    /// Advance past steps a failed or short-circuited item skipped.
    fn complete_item(&mut self, steps: usize) {
        while self.item_steps < steps {
            self.step();
        }
    }

    // ------------------------------------------------------------------------
    // Fonts
    // ------------------------------------------------------------------------

    fn build_font(&mut self, id: &SourceId) -> Result<BuildOutcome, BuildError> {
        let font = UfoFont::open(id.path())?;
        let name = font.display_name();
        let job = Job {
            target: GenerateTarget::Font(id.path().to_path_buf()),
            family: font.family_name.clone().unwrap_or_else(|| font.file_stem()),
            style: font.style_name.clone().unwrap_or_else(|| "Regular".to_owned()),
            options: GenerateOptions::test_install(font.glyph_order),
        };

        let staged = self.stage(&job)?;
        self.step();

        let live = self.registry.find(id, &name).cloned();
        if let Some(live) = &live
            && live.artifact_path == staged.target
            && staged.target.is_file()
        {
            discard(&staged.staging);
            if live.source.as_ref() != Some(id) {
                // Found through the name fallback: re-key to this source.
                self.registry.record_install(Some(id), &staged.target, &name);
            }
            crate::debug!("install"; "{} unchanged", name);
            return Ok(BuildOutcome {
                retained: 1,
                ..BuildOutcome::default()
            });
        }

        let mut outcome = BuildOutcome::default();
        if let Some(live) = live {
            self.registry
                .retire_artifact(&live.artifact_path, self.installer.as_mut());
            outcome.retired = 1;
        }
        self.step();

        self.install_staged(&staged)?;
        self.step();

        self.registry.record_install(Some(id), &staged.target, &name);
        self.step();

        crate::log!("install"; "installed {}", name);
        outcome.installed = 1;
        Ok(outcome)
    }

    // ------------------------------------------------------------------------
    // Design spaces
    // ------------------------------------------------------------------------

    fn build_designspace(&mut self, id: &SourceId) -> Result<BuildOutcome, BuildError> {
        let ds = DesignSpace::open(id.path())?;

        // Unresolvable groups abort here, before anything is touched.
        let corrections = self.resolver.resolve(&ds)?;
        if !corrections.is_empty() {
            crate::log!("compat"; "{}: corrected {} glyph file(s)", id, corrections.len());
        }
        self.step();

        let jobs = designspace_jobs(&ds)?;
        let mut staged: BTreeMap<PathBuf, Staged> = BTreeMap::new();
        for job in &jobs {
            match self.stage(job) {
                Ok(s) if staged.contains_key(&s.target) => discard(&s.staging),
                Ok(s) => {
                    staged.insert(s.target.clone(), s);
                }
                Err(e) => {
                    for s in staged.values() {
                        discard(&s.staging);
                    }
                    return Err(e);
                }
            }
        }
        self.step();

        let previous = self.registry.designspace_set(id);
        let retained: BTreeSet<PathBuf> = staged
            .keys()
            .filter(|target| previous.contains(*target) && target.is_file())
            .cloned()
            .collect();

        let mut outcome = BuildOutcome {
            retained: retained.len(),
            corrections,
            ..BuildOutcome::default()
        };

        for path in previous.difference(&retained) {
            self.registry.retire_artifact(path, self.installer.as_mut());
            outcome.retired += 1;
        }
        self.step();

        let mut first_error = None;
        for (target, s) in &staged {
            if retained.contains(target) {
                discard(&s.staging);
                continue;
            }
            match self.install_staged(s) {
                Ok(()) => {
                    self.registry.record_designspace_install(id, target, &s.name);
                    outcome.installed += 1;
                }
                Err(e) => {
                    crate::log!("error"; "{}: {}", s.name, e);
                    first_error.get_or_insert(e);
                }
            }
        }
        self.step();

        if let Some(e) = first_error {
            return Err(e);
        }
        self.step();

        crate::log!(
            "install";
            "{}: {} installed, {} unchanged, {} retired",
            id,
            outcome.installed,
            outcome.retained,
            outcome.retired
        );
        Ok(outcome)
    }

    // ------------------------------------------------------------------------
    // Shared steps
    // ------------------------------------------------------------------------

    /// Compile into a staging file and compute the final path.
    fn stage(&mut self, job: &Job) -> Result<Staged, BuildError> {
        let staging = self.store.staging_path()?;
        match self.generator.generate(&job.target, &staging, &job.options) {
            Ok(report) if !report.is_empty() => {
                crate::debug!("install"; "{}: {}", job.target.describe(), report);
            }
            Ok(_) => {}
            Err(e) => {
                discard(&staging);
                return Err(e.into());
            }
        }
        let hash = match self.store.hash(&staging) {
            Ok(hash) => hash,
            Err(e) => {
                discard(&staging);
                return Err(e);
            }
        };
        Ok(Staged {
            target: self.store.final_path(&job.family, &job.style, hash),
            staging,
            name: format!("{} {}", job.family, job.style),
        })
    }

    /// Move into place and register. A rejected artifact is deleted.
    fn install_staged(&mut self, staged: &Staged) -> Result<(), BuildError> {
        if let Err(e) = self.store.promote(&staged.staging, &staged.target) {
            discard(&staged.staging);
            return Err(e);
        }
        let report = self.installer.install(&staged.target);
        if !report.success {
            discard(&staged.target);
            return Err(BuildError::Install {
                artifact: staged.target.clone(),
                report: report.report,
            });
        }
        crate::debug!("install"; "{}", report.report);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------------

    /// Synchronously retire everything a source owns.
    pub fn teardown(&mut self, id: &SourceId) -> usize {
        self.queued.remove(id);
        let retired = self.registry.retire_all_of(id, self.installer.as_mut());
        for record in &retired {
            crate::log!("install"; "uninstalled {}", record.name);
        }
        retired.len()
    }

    /// Retire every live artifact.
    pub fn teardown_all(&mut self) -> usize {
        self.queued.clear();
        self.registry.retire_everything(self.installer.as_mut())
    }

    /// Drop persisted records whose source is no longer watched.
    pub fn prune_orphans(&mut self, watched: &BTreeSet<SourceId>) -> usize {
        let pruned = self.registry.prune(self.installer.as_mut(), |record| {
            record.owner().is_some_and(|owner| watched.contains(owner))
        });
        for record in &pruned {
            crate::debug!("install"; "pruned orphan {}", record.artifact_path.display());
        }
        pruned.len()
    }

    pub fn sweep_staging(&self) -> usize {
        self.store.sweep_staging()
    }
}

/// Compile jobs for a design space: its instances, or every master when it
/// defines none.
fn designspace_jobs(ds: &DesignSpace) -> Result<Vec<Job>, BuildError> {
    let stem = ds
        .path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Untitled".to_owned());

    if ds.instances.is_empty() {
        return ds
            .master_paths()
            .into_iter()
            .map(|path| -> Result<Job, BuildError> {
                let font = UfoFont::open(&path)?;
                Ok(Job {
                    family: font.family_name.clone().unwrap_or_else(|| stem.clone()),
                    style: font.style_name.clone().unwrap_or_else(|| font.file_stem()),
                    options: GenerateOptions::test_install(font.glyph_order),
                    target: GenerateTarget::Font(path),
                })
            })
            .collect();
    }

    let glyph_order = ds
        .default_source()
        .and_then(|i| UfoFont::open(&ds.sources[i].filename).ok())
        .map(|font| font.glyph_order)
        .unwrap_or_default();

    Ok(ds
        .instances
        .iter()
        .map(|instance| {
            let selector = instance.selector();
            Job {
                family: instance.family_name.clone().unwrap_or_else(|| stem.clone()),
                style: instance
                    .style_name
                    .clone()
                    .unwrap_or_else(|| selector.clone()),
                options: GenerateOptions::test_install(glyph_order.clone()),
                target: GenerateTarget::Instance {
                    designspace: ds.path.clone(),
                    instance: selector,
                },
            }
        })
        .collect())
}
