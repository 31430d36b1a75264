//! Registry errors

use std::path::PathBuf;

/// Errors that can occur while publishing to the registry
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Manifest not found at {}. Run 'dbt compile' or 'dbt build' first.", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid publish timestamp '{0}' (expected YYYYMMDDTHHMMSSZ)")]
    InvalidTimestamp(String),
}

impl RegistryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
