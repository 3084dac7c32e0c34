use std::path::PathBuf;

use dsync_types::{LogicalId, RemoteDatasetId, StoreId, TypeError};

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The remote dataset does not exist.
    #[error("remote dataset not found: {0}")]
    DatasetNotFound(RemoteDatasetId),

    /// No record with this store id exists in the dataset.
    #[error("record not found: {0}")]
    RecordNotFound(StoreId),

    /// No local document with this logical id exists.
    #[error("document not found: {0}")]
    DocumentNotFound(LogicalId),

    /// The attachment does not exist.
    #[error("file {name} not found for document {logical_id}")]
    FileNotFound { logical_id: LogicalId, name: String },

    /// A name that cannot be used as a path component.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// The store refused the request.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Stored data could not be decoded.
    #[error("corrupt entry {path:?}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// A document did not satisfy the document model.
    #[error("invalid document: {0}")]
    Type(#[from] TypeError),

    /// A chunk archive could not be read.
    #[error("archive error: {0}")]
    Pack(#[from] dsync_pack::PackError),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
