//! `[install]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [install]
//! root = "~/.cache/autoinstall/artifacts"
//! state_file = "~/.cache/autoinstall/installed.json"
//! fonts_dir = "~/.local/share/fonts"
//! refresh_command = ["fc-cache", "-f"]
//! prune_orphans = true
//! uninstall_on_exit = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::build::FontDirInstaller;
use crate::config::{ConfigDiagnostics, FieldPath};
use crate::utils::path::expand_path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Where generated artifacts are kept.
    pub root: PathBuf,
    /// Persisted install records.
    pub state_file: PathBuf,
    /// User fonts directory the installer copies into.
    pub fonts_dir: PathBuf,
    /// Run after every install/uninstall (e.g. `fc-cache -f`).
    pub refresh_command: Vec<String>,
    /// Drop persisted installs whose source is no longer watched.
    pub prune_orphans: bool,
    pub uninstall_on_exit: bool,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            root: "~/.cache/autoinstall/artifacts".into(),
            state_file: "~/.cache/autoinstall/installed.json".into(),
            fonts_dir: FontDirInstaller::default_fonts_dir().into(),
            refresh_command: Vec::new(),
            prune_orphans: true,
            uninstall_on_exit: true,
        }
    }
}

impl InstallConfig {
    pub(crate) fn normalize(&mut self, root: &Path) {
        self.root = expand_path(&self.root, root);
        self.state_file = expand_path(&self.state_file, root);
        self.fonts_dir = expand_path(&self.fonts_dir, root);
    }

    pub(crate) fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.state_file.starts_with(&self.root) {
            diag.error_with_hint(
                FieldPath::new("install.state_file"),
                "state file must not live inside the artifact root",
                "the artifact root is swept on startup",
            );
        }
        if self.fonts_dir == self.root {
            diag.error(
                FieldPath::new("install.fonts_dir"),
                "fonts directory must differ from the artifact root",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_install_paths_resolve_against_root() {
        let mut config = test_parse_config(
            "[install]\nroot = \"cache/artifacts\"\nstate_file = \"cache/installed.json\"\nfonts_dir = \"fonts\"",
        );
        config.install.normalize(Path::new("/project"));

        assert_eq!(config.install.root, Path::new("/project/cache/artifacts"));
        assert_eq!(config.install.state_file, Path::new("/project/cache/installed.json"));
        assert_eq!(config.install.fonts_dir, Path::new("/project/fonts"));
    }

    #[test]
    fn test_state_file_inside_root_rejected() {
        let mut config = test_parse_config(
            "[install]\nroot = \"cache\"\nstate_file = \"cache/installed.json\"",
        );
        config.install.normalize(Path::new("/project"));

        let mut diag = ConfigDiagnostics::new();
        config.install.validate(&mut diag);
        assert_eq!(diag.len(), 1);
        assert_eq!(diag.errors()[0].field.as_str(), "install.state_file");
    }
}
