//! `check`: run the compatibility pre-pass on a design space by hand.

use std::path::Path;

use anyhow::{Result, bail};
use owo_colors::OwoColorize;

use crate::compat::{CompatReport, CompatResolver};
use crate::config::AutoInstallConfig;
use crate::logger::{status_success, status_unchanged, status_warning};
use crate::ufo::DesignSpace;
use crate::utils::path::resolve_path;
use crate::utils::plural::plural_count;

pub fn check(config: &AutoInstallConfig, designspace: &Path, fix: bool) -> Result<()> {
    let path = resolve_path(designspace, &std::env::current_dir()?);
    let ds = DesignSpace::open(&path)?;
    let resolver = CompatResolver::new(config.compat.threshold);
    let report = resolver.analyze(&ds)?;

    print_report(&report);

    if !report.is_resolvable() {
        bail!(
            "{} cannot be made compatible",
            plural_count(report.unresolvable().count(), "glyph")
        );
    }

    let pending = report.pending_corrections();
    if pending == 0 {
        status_unchanged("masters are compatible");
    } else if fix {
        let written = resolver.apply(&ds, &report)?;
        status_success(&format!("corrected {}", plural_count(written.len(), "glyph file")));
    } else {
        status_warning(&format!(
            "{} would be corrected (run with --fix)",
            plural_count(pending, "glyph file")
        ));
    }
    Ok(())
}

fn print_report(report: &CompatReport) {
    println!(
        "{} at threshold {}",
        plural_count(report.groups.len(), "glyph group"),
        report.threshold
    );
    for group in report.unresolvable() {
        let reason = group.unresolvable.as_deref().unwrap_or_default();
        println!("  {} {}: {}", "✗".red(), group.label(), reason);
    }
    for group in &report.groups {
        for (member, matched) in group.corrections(report.threshold) {
            println!(
                "  {} {} in {} (confidence {:.2})",
                "~".yellow(),
                group.label(),
                member.glif.display(),
                matched.confidence
            );
        }
    }
}
