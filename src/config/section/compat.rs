//! `[compat]` section configuration.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Design-space compatibility resolver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompatConfig {
    /// Minimum match score for a contour pairing, in `[0, 1]`.
    pub threshold: f64,
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self {
            threshold: crate::compat::DEFAULT_THRESHOLD,
        }
    }
}

impl CompatConfig {
    pub(crate) fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !(0.0..=1.0).contains(&self.threshold) {
            diag.error_with_hint(
                FieldPath::new("compat.threshold"),
                format!("threshold {} is outside [0, 1]", self.threshold),
                "the default is 0.9",
            );
        }
    }
}
