//! `[schedule]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [schedule]
//! install_after_change_delay = 5  # Quiet period in seconds, 0 = manual only
//! install_after_save = false      # Rebuild a source as soon as it is saved
//! install_after_app_exit = true   # Flush pending work when the editor goes inactive
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Seconds without edits before a batch runs.
    pub install_after_change_delay: u64,
    pub install_after_save: bool,
    pub install_after_app_exit: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            install_after_change_delay: 5,
            install_after_save: false,
            install_after_app_exit: true,
        }
    }
}

impl ScheduleConfig {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_secs(self.install_after_change_delay)
    }
}
