//! Source reading errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or rewriting source files.
#[derive(Debug, Error)]
pub enum UfoError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("malformed XML in `{path}`: {message}")]
    Xml { path: PathBuf, message: String },

    #[error("unexpected content in `{path}`: {message}")]
    Format { path: PathBuf, message: String },
}

impl UfoError {
    pub(super) fn xml(path: &std::path::Path, message: impl ToString) -> Self {
        Self::Xml {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    pub(super) fn format(path: &std::path::Path, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}
