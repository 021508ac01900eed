//! `status`: list recorded installs.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use crate::config::AutoInstallConfig;
use crate::registry::Registry;

pub fn status(config: &AutoInstallConfig) -> Result<()> {
    let state_file = &config.install.state_file;
    let registry = Registry::open(state_file)
        .with_context(|| format!("failed to read install records from {}", state_file.display()))?;

    if registry.is_empty() {
        println!("nothing installed");
        return Ok(());
    }

    for record in registry.records() {
        let owner = record
            .owner()
            .map(|id| id.path().display().to_string())
            .unwrap_or_else(|| "(unknown source)".to_owned());
        let missing = if record.artifact_path.exists() { "" } else { " (missing)" };
        println!(
            "{}  {}{}\n    {}",
            record.name.bold(),
            owner.dimmed(),
            missing.yellow(),
            record.artifact_path.display()
        );
    }
    Ok(())
}
