//! Error types for sync index persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing a sync index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The dataset pairing cannot be mapped to a storage location.
    #[error("invalid dataset pairing: {0}")]
    InvalidPair(String),

    /// The stored index could not be decoded.
    #[error("corrupt sync index at {path:?}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// Serialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error during file-based index operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for index operations.
pub type IndexResult<T> = std::result::Result<T, IndexError>;
