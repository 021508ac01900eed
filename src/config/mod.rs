//! Configuration management for `autoinstall.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! ├── types/         # ConfigError, diagnostics, global handle
//! └── mod.rs         # AutoInstallConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section        | Purpose                                         |
//! |----------------|-------------------------------------------------|
//! | `[schedule]`   | Quiet period and save / app-exit policies       |
//! | `[install]`    | Artifact root, state file, fonts directory      |
//! | `[generator]`  | External compiler command and argument templates|
//! | `[compat]`     | Compatibility resolver threshold                |
//! | `[sources]`    | Fonts and design spaces watched at startup      |
//! | `[control]`    | Local control endpoint for editor signals       |

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{
    CompatConfig, ControlConfig, GeneratorConfig, InstallConfig, ScheduleConfig, SourcesConfig,
};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath, cfg, init_config, reload_config};

use crate::cli::Cli;
use crate::core::SourceKind;
use crate::engine::Settings;
use crate::log;
use crate::utils::path::{normalize_path, resolve_path};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing autoinstall.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoInstallConfig {
    /// Absolute path to the config file (may not exist)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Base for relative paths: the config file's directory, or cwd
    #[serde(skip)]
    pub root: PathBuf,

    /// Sources given on the command line, kept across reloads
    #[serde(skip)]
    pub extra_sources: Vec<PathBuf>,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub install: InstallConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default)]
    pub compat: CompatConfig,

    #[serde(default)]
    pub sources: SourcesConfig,

    #[serde(default)]
    pub control: ControlConfig,
}

impl AutoInstallConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. Without one, defaults
    /// apply and relative paths resolve against cwd.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = normalize_path(&path);
                config
            }
            None => {
                crate::debug!("config"; "{} not found, using defaults", cli.config.display());
                Self {
                    config_path: cwd.join(&cli.config),
                    ..Self::default()
                }
            }
        };

        let root = config
            .config_path
            .parent()
            .filter(|_| config.config_path.exists())
            .map_or_else(|| cwd.clone(), Path::to_path_buf);
        config.finalize(&root);
        config.extra_sources = cli
            .source_args()
            .iter()
            .map(|path| resolve_path(path, &cwd))
            .collect();

        config.validate()?;
        Ok(config)
    }

    /// Parse a new version of this config file, keeping the command-line state.
    pub fn reload_from(&self, content: &str) -> Result<Self> {
        let (mut config, ignored) = Self::parse_with_ignored(content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, &self.config_path);
        }
        config.config_path = self.config_path.clone();
        config.extra_sources = self.extra_sources.clone();
        config.finalize(&self.root);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Normalize all paths relative to `root`.
    fn finalize(&mut self, root: &Path) {
        self.root = normalize_path(root);
        self.install.normalize(&self.root);
        self.sources.normalize(&self.root);
    }

    // ========================================================================
    // derived values
    // ========================================================================

    /// Engine policy from `[schedule]`, `[install]` and `[compat]`.
    pub fn to_settings(&self) -> Settings {
        Settings {
            quiet: self.schedule.quiet_period(),
            install_after_save: self.schedule.install_after_save,
            install_after_app_exit: self.schedule.install_after_app_exit,
            uninstall_on_exit: self.install.uninstall_on_exit,
            prune_orphans: self.install.prune_orphans,
            compat_threshold: self.compat.threshold,
        }
    }

    /// Every source to enable: configured ones, then command-line ones.
    pub fn source_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = Vec::new();
        for path in self.sources.paths().chain(&self.extra_sources) {
            if !paths.contains(path) {
                paths.push(path.clone());
            }
        }
        paths
    }

    /// Effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize config")
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.schedule_warnings(&mut diag);
        self.install.validate(&mut diag);
        self.generator.validate(&mut diag);
        self.compat.validate(&mut diag);
        self.sources.validate(&mut diag);

        for path in &self.extra_sources {
            let field = FieldPath::new("PATH");
            if !path.exists() {
                diag.error(field, format!("`{}` does not exist", path.display()));
            } else if SourceKind::from_path(path).is_none() {
                diag.error_with_hint(
                    field,
                    format!("`{}` is not a font source", path.display()),
                    "pass a `.ufo` directory or a `.designspace` file",
                );
            }
        }

        diag.print_warnings();
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    fn schedule_warnings(&self, diag: &mut ConfigDiagnostics) {
        if self.schedule.install_after_change_delay == 0 {
            diag.warn(
                FieldPath::new("schedule.install_after_change_delay"),
                "0 disables automatic installs; use `install` or the control endpoint",
            );
        }
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config from TOML.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> AutoInstallConfig {
    let (parsed, ignored) = AutoInstallConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_invalid_toml() {
        let result = AutoInstallConfig::parse_with_ignored("[schedule\ninstall_after_save = true");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[schedule]\ninstall_after_save = true\ndelay = 3\n[unknown_section]\nfield = 1";
        let (config, ignored) = AutoInstallConfig::parse_with_ignored(content).unwrap();

        assert!(config.schedule.install_after_save);
        assert!(ignored.iter().any(|f| f == "schedule.delay"));
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_to_settings() {
        let config = test_parse_config(
            "[schedule]\ninstall_after_change_delay = 2\ninstall_after_save = true\n\
             [install]\nprune_orphans = false\nuninstall_on_exit = false\n\
             [compat]\nthreshold = 0.8",
        );
        let settings = config.to_settings();
        assert_eq!(settings.quiet, Duration::from_secs(2));
        assert!(settings.install_after_save);
        assert!(settings.install_after_app_exit);
        assert!(!settings.prune_orphans);
        assert!(!settings.uninstall_on_exit);
        assert_eq!(settings.compat_threshold, 0.8);
    }

    #[test]
    fn test_default_settings_match_engine_defaults() {
        assert_eq!(test_parse_config("").to_settings(), Settings::default());
    }

    #[test]
    fn test_source_paths_dedupe() {
        let mut config = test_parse_config("[sources]\nfonts = [\"/fonts/A.ufo\"]");
        config.extra_sources = vec![PathBuf::from("/fonts/A.ufo"), PathBuf::from("/fonts/B.ufo")];
        assert_eq!(
            config.source_paths(),
            [PathBuf::from("/fonts/A.ufo"), PathBuf::from("/fonts/B.ufo")]
        );
    }

    #[test]
    fn test_reload_keeps_command_line_state() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        let ufo = root.join("Regular.ufo");
        fs::create_dir_all(&ufo).unwrap();

        let mut config = AutoInstallConfig {
            config_path: root.join("autoinstall.toml"),
            extra_sources: vec![ufo.clone()],
            ..AutoInstallConfig::default()
        };
        config.finalize(&root);

        let reloaded = config
            .reload_from("[schedule]\ninstall_after_change_delay = 9")
            .unwrap();
        assert_eq!(reloaded.schedule.quiet_period(), Duration::from_secs(9));
        assert_eq!(reloaded.extra_sources, [ufo]);
        assert_eq!(reloaded.config_path, root.join("autoinstall.toml"));

        // Invalid content is rejected rather than applied.
        assert!(config.reload_from("[compat]\nthreshold = 2.0").is_err());
    }

    #[test]
    fn test_missing_extra_source_rejected() {
        let config = AutoInstallConfig {
            extra_sources: vec![PathBuf::from("/no/such/Font.ufo")],
            ..AutoInstallConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_to_toml_lists_sections() {
        let toml = test_parse_config("").to_toml().unwrap();
        for section in ["[schedule]", "[install]", "[generator]", "[compat]", "[control]"] {
            assert!(toml.contains(section), "missing {section}");
        }
        // Internal fields stay out.
        assert!(!toml.contains("config_path"));
    }
}
