//! Error types for the indexer.
//!
//! Structured errors via thiserror, with actionable messages. The symbol
//! pass itself never fails on malformed input; errors here cover the edges
//! of the system: the file system, configuration, and the on-disk cache.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for indexing operations.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse PHP file '{path}': {reason}")]
    ParseFailed { path: PathBuf, reason: String },

    #[error("Unsupported file type '{extension}' for file '{path}'. Supported types: .php, .inc")]
    UnsupportedFileType { path: PathBuf, extension: String },

    #[error("Failed to persist cache to '{path}': {source}")]
    PersistenceError {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {reason}")]
    ConfigError { reason: String },

    #[error("{0}")]
    General(String),
}

/// Errors specific to cache storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache record could not be decoded: {0}")]
    Record(#[from] serde_json::Error),

    #[error("Cache file is not in the expected format: {reason}")]
    InvalidFormat { reason: String },
}

/// Result type alias for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Helper trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, msg: &str) -> Result<T, IndexError>;

    /// Add context with a path.
    fn with_path(self, path: &std::path::Path) -> Result<T, IndexError>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: &str) -> Result<T, IndexError> {
        self.map_err(|e| IndexError::General(format!("{msg}: {e}")))
    }

    fn with_path(self, path: &std::path::Path) -> Result<T, IndexError> {
        self.map_err(|e| {
            IndexError::General(format!("Error processing '{}': {}", path.display(), e))
        })
    }
}
