//! `[sources]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [sources]
//! fonts = ["Regular.ufo", "~/fonts/Mono-Bold.ufo"]
//! designspaces = ["Family.designspace"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::core::SourceKind;
use crate::utils::path::expand_path;

/// Sources enabled when watch mode starts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub fonts: Vec<PathBuf>,
    pub designspaces: Vec<PathBuf>,
}

impl SourcesConfig {
    pub(crate) fn normalize(&mut self, root: &Path) {
        for path in self.fonts.iter_mut().chain(self.designspaces.iter_mut()) {
            *path = expand_path(path, root);
        }
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.fonts.iter().chain(&self.designspaces)
    }

    pub(crate) fn validate(&self, diag: &mut ConfigDiagnostics) {
        check_kind(diag, FieldPath::new("sources.fonts"), &self.fonts, SourceKind::Font);
        check_kind(
            diag,
            FieldPath::new("sources.designspaces"),
            &self.designspaces,
            SourceKind::DesignSpace,
        );
    }
}

fn check_kind(diag: &mut ConfigDiagnostics, field: FieldPath, paths: &[PathBuf], kind: SourceKind) {
    for path in paths {
        if !path.exists() {
            diag.error(field, format!("`{}` does not exist", path.display()));
        } else if SourceKind::from_path(path) != Some(kind) {
            diag.error_with_hint(
                field,
                format!("`{}` is not a {}", path.display(), kind.label()),
                "fonts are `.ufo` directories, design spaces are `.designspace` files",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_sources_validate_existence_and_kind() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Regular.ufo")).unwrap();
        fs::write(dir.path().join("Fam.designspace"), "<designspace/>").unwrap();

        let mut config = test_parse_config(
            "[sources]\nfonts = [\"Regular.ufo\", \"Missing.ufo\"]\ndesignspaces = [\"Regular.ufo\"]",
        );
        config.sources.normalize(dir.path());

        let mut diag = ConfigDiagnostics::new();
        config.sources.validate(&mut diag);
        let fields: Vec<_> = diag.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["sources.fonts", "sources.designspaces"]);
        assert_eq!(config.sources.paths().count(), 3);
    }
}
