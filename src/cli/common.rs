//! Wiring shared by every command that touches installs.

use anyhow::{Context, Result};

use crate::build::{ArtifactStore, FontDirInstaller, Orchestrator, TerminalProgress};
use crate::compat::CompatResolver;
use crate::config::AutoInstallConfig;
use crate::engine::AutoInstaller;
use crate::registry::Registry;

/// Open the persisted registry and assemble the build pipeline.
///
/// `check_generator` is false for commands that only retire artifacts, so
/// they still work on machines without the compiler installed.
pub fn build_orchestrator(config: &AutoInstallConfig, check_generator: bool) -> Result<Orchestrator> {
    let generator = config.generator.to_generator();
    if check_generator {
        let program = generator.check_available()?;
        crate::debug!("build"; "using {}", program.display());
    }

    let registry = Registry::open(&config.install.state_file).with_context(|| {
        format!(
            "failed to read install records from {}",
            config.install.state_file.display()
        )
    })?;

    let installer = FontDirInstaller::new(
        config.install.fonts_dir.clone(),
        config.install.refresh_command.clone(),
    );

    Ok(Orchestrator::new(
        Box::new(generator),
        Box::new(installer),
        registry,
        CompatResolver::new(config.compat.threshold),
        ArtifactStore::new(config.install.root.clone()),
    )
    .with_progress(Box::<TerminalProgress>::default()))
}

/// Engine over a fresh orchestrator with the configured settings.
pub fn build_engine(config: &AutoInstallConfig) -> Result<AutoInstaller> {
    let orchestrator = build_orchestrator(config, true)?;
    Ok(AutoInstaller::new(orchestrator, config.to_settings()))
}
