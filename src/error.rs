//! Error taxonomy for the context engine.
//!
//! Vault-level failures ([`ContextError::Io`]) abort an index build.
//! Per-file failures ([`ContextError::Parse`]) never do: the scan records
//! them as skipped files and moves on.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextError {
    /// The vault root is missing, not a directory, or cannot be walked.
    #[error("vault unreadable: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A single note could not be parsed. Non-fatal during a scan.
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    /// A query arrived before any successful index build.
    #[error("index not ready: no vault has been indexed yet")]
    IndexNotReady,

    #[error("invalid weight `{field}`: {value} is outside [0, 1]")]
    InvalidWeights { field: &'static str, value: f64 },

    #[error("invalid glob pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl ContextError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ContextError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: &str, message: impl Into<String>) -> Self {
        ContextError::Parse {
            path: path.to_string(),
            message: message.into(),
        }
    }
}
