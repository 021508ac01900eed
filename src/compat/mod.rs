//! Master compatibility pre-pass for design spaces.
//!
//! Every glyph is grouped with its variants at the same discrete location.
//! A group either cannot be reconciled (the build is aborted before anything
//! is touched) or each member is matched against the best reference and,
//! when it is out of order or scores at or below the threshold, rewritten
//! on disk so the compiler sees compatible masters.

mod group;
mod matching;


use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;

use crate::ufo::{DesignSpace, UfoError, rewrite_glif};
use crate::utils::hash::{ContentHash, hash_bytes};

pub use group::{CompatibilityGroup, collect_groups};

/// Confidence at or below which a member is rewritten.
pub const DEFAULT_THRESHOLD: f64 = 0.9;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Source(#[from] UfoError),

    #[error("{} has {} unresolvable glyph(s): {}", .designspace.display(), .glyphs.len(), .glyphs.join(", "))]
    Unresolvable {
        designspace: PathBuf,
        glyphs: Vec<String>,
    },

    #[error("failed to write corrected glyph `{0}`")]
    Write(PathBuf, #[source] std::io::Error),
}

/// Analysis of one design space.
#[derive(Debug, Clone)]
pub struct CompatReport {
    pub groups: Vec<CompatibilityGroup>,
    pub threshold: f64,
}

impl CompatReport {
    pub fn unresolvable(&self) -> impl Iterator<Item = &CompatibilityGroup> {
        self.groups.iter().filter(|g| g.unresolvable.is_some())
    }

    pub fn is_resolvable(&self) -> bool {
        self.unresolvable().next().is_none()
    }

    /// Number of member glyphs that would be rewritten.
    pub fn pending_corrections(&self) -> usize {
        self.groups
            .iter()
            .map(|g| g.corrections(self.threshold).count())
            .sum()
    }
}

/// A glyph file written by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub path: PathBuf,
    pub hash: ContentHash,
}

#[derive(Debug, Clone, Copy)]
pub struct CompatResolver {
    threshold: f64,
}

impl Default for CompatResolver {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl CompatResolver {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Group and match every glyph. Nothing is written.
    pub fn analyze(&self, ds: &DesignSpace) -> Result<CompatReport, ResolveError> {
        let mut groups = collect_groups(ds)?;
        groups.par_iter_mut().for_each(CompatibilityGroup::evaluate);
        Ok(CompatReport {
            groups,
            threshold: self.threshold,
        })
    }

    /// Analyze, then persist every correction. Any unresolvable group aborts
    /// before a single file is modified.
    pub fn resolve(&self, ds: &DesignSpace) -> Result<Vec<Correction>, ResolveError> {
        let report = self.analyze(ds)?;
        self.apply(ds, &report)
    }

    /// Persist the corrections of an existing report.
    pub fn apply(
        &self,
        ds: &DesignSpace,
        report: &CompatReport,
    ) -> Result<Vec<Correction>, ResolveError> {
        if !report.is_resolvable() {
            return Err(ResolveError::Unresolvable {
                designspace: ds.path.clone(),
                glyphs: report.unresolvable().map(CompatibilityGroup::label).collect(),
            });
        }

        // Render everything first so a malformed file leaves the rest untouched.
        let mut pending = Vec::new();
        for group in &report.groups {
            for (member, matched) in group.corrections(self.threshold) {
                let bytes = fs::read(&member.glif)
                    .map_err(|e| UfoError::Io(member.glif.clone(), e))?;
                let rewritten = rewrite_glif(&bytes, &matched.edit, &member.glif)?;
                pending.push((member.glif.clone(), rewritten));
            }
        }

        pending
            .into_iter()
            .map(|(path, bytes)| write_correction(&path, &bytes))
            .collect()
    }
}

fn write_correction(path: &Path, bytes: &[u8]) -> Result<Correction, ResolveError> {
    fs::write(path, bytes).map_err(|e| ResolveError::Write(path.to_path_buf(), e))?;
    crate::debug!("compat"; "corrected {}", path.display());
    Ok(Correction {
        path: path.to_path_buf(),
        hash: hash_bytes(bytes),
    })
}
