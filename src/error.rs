use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate {field}: {key}")]
    DuplicateKey { field: &'static str, key: String },
    #[error("{field} not found: {key}")]
    NotFound { field: &'static str, key: String },
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Stable error code reported over IPC.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::DuplicateKey { .. } => "duplicate_key",
            StoreError::NotFound { .. } => "not_found",
            StoreError::Parse { .. } => "parse_failed",
            StoreError::Io { .. } => "io_failed",
        }
    }
}
