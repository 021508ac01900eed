//! `install` and `uninstall`: one-shot counterparts of watch mode.

use std::path::PathBuf;

use anyhow::{Result, bail};

use crate::build::BatchReport;
use crate::config::AutoInstallConfig;
use crate::core::SourceId;
use crate::engine::AutoInstaller;
use crate::logger::status_success;
use crate::utils::plural::plural_count;

/// Build and install once. Artifacts stay installed afterwards.
pub fn install(config: &AutoInstallConfig, paths: &[PathBuf]) -> Result<()> {
    let sources = if paths.is_empty() {
        config.source_paths()
    } else {
        config.extra_sources.clone()
    };
    if sources.is_empty() {
        bail!("nothing to install: pass sources or list them under [sources]");
    }

    let mut settings = config.to_settings();
    // A partial install must not retire the other sources' artifacts.
    settings.prune_orphans &= paths.is_empty();
    let orchestrator = super::common::build_orchestrator(config, true)?;
    let mut engine = AutoInstaller::new(orchestrator, settings);
    let report = engine.startup(&sources);
    finish(&report)
}

/// Failures were already logged per source; this only sums up.
fn finish(report: &BatchReport) -> Result<()> {
    if report.is_success() {
        status_success(&report.summary());
        Ok(())
    } else {
        bail!("install incomplete: {}", report.summary())
    }
}

/// Retire the artifacts of the given sources, or every recorded artifact.
pub fn uninstall(config: &AutoInstallConfig, paths: &[PathBuf], all: bool) -> Result<()> {
    let mut orchestrator = super::common::build_orchestrator(config, false)?;

    let retired = if all {
        orchestrator.teardown_all()
    } else {
        let ids: Vec<SourceId> = if paths.is_empty() {
            config.source_paths().iter().map(SourceId::new).collect()
        } else {
            paths.iter().map(SourceId::new).collect()
        };
        ids.iter().map(|id| orchestrator.teardown(id)).sum()
    };

    if retired == 0 {
        crate::logger::status_unchanged("nothing installed");
    } else {
        status_success(&format!("uninstalled {}", plural_count(retired, "artifact")));
    }
    Ok(())
}
