//! Error types for the fact archive

use std::path::PathBuf;
use thiserror::Error;

/// Result type used across the crate
pub type Result<T> = std::result::Result<T, FactError>;

/// Errors surfaced by the archive and configuration loading.
///
/// Fetch failures are not errors of the cycle; see `CycleOutcome::FetchFailed`.
#[derive(Debug, Error)]
pub enum FactError {
    #[error("Archive {path} is unreadable: {reason}")]
    ArchiveRead { path: PathBuf, reason: String },

    #[error("Failed to write archive {path}: {source}")]
    ArchiveWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl FactError {
    /// Build an `ArchiveWrite` error for the given path
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ArchiveWrite {
            path: path.into(),
            source,
        }
    }

    /// True when the error came from persisting the archive
    pub fn is_write_failure(&self) -> bool {
        matches!(self, Self::ArchiveWrite { .. })
    }
}

impl From<config::ConfigError> for FactError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}
