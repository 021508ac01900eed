//! Build failures.

use std::path::PathBuf;

use thiserror::Error;

use crate::compat::ResolveError;
use crate::ufo::UfoError;

/// The external compiler did not produce an artifact.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("compiler `{0}` not found in PATH")]
    MissingProgram(String),

    #[error("compiler failed for {target}: {message}")]
    Failed { target: String, message: String },

    #[error("compiler reported success but wrote nothing to `{0}`")]
    NoOutput(PathBuf),
}

/// Why a source could not be rebuilt. None of these are fatal.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Artifact compile failed. The previous artifact stays live.
    #[error(transparent)]
    Generation(#[from] GenerateError),

    /// The installer rejected a generated artifact.
    #[error("install rejected `{}`: {report}", .artifact.display())]
    Install { artifact: PathBuf, report: String },

    /// A design space has glyphs whose masters cannot be reconciled.
    #[error("{} unresolvable glyph(s): {}", .glyphs.len(), .glyphs.join(", "))]
    Unresolvable { glyphs: Vec<String> },

    #[error(transparent)]
    Source(#[from] UfoError),

    #[error("artifact I/O on `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),
}

impl From<ResolveError> for BuildError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Source(e) => Self::Source(e),
            ResolveError::Unresolvable { glyphs, .. } => Self::Unresolvable { glyphs },
            ResolveError::Write(path, e) => Self::Io(path, e),
        }
    }
}
