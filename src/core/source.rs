//! Source identity and kind.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::utils::path::normalize_path;

/// What kind of editable source a path is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A single UFO font.
    Font,
    /// A multi-master `.designspace` document.
    DesignSpace,
}

impl SourceKind {
    /// Infer the kind from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "ufo" | "ufoz" => Some(Self::Font),
            "designspace" => Some(Self::DesignSpace),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Font => "font",
            Self::DesignSpace => "designspace",
        }
    }
}

/// Stable identity of a watched source: its normalized absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(PathBuf);

impl SourceId {
    /// Build from a user-supplied path (normalized).
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self(normalize_path(path.as_ref()))
    }

    /// Build from a path that is already normalized (no filesystem access).
    #[cfg(test)]
    pub fn from_normalized(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// File name for display (`Regular.ufo`).
    pub fn file_name(&self) -> String {
        self.0
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.0.display().to_string())
    }

    /// Whether `path` is this source or lies inside it.
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.0)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}
