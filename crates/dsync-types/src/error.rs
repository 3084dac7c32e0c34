use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("missing required property: {0}")]
    MissingProperty(&'static str),

    #[error("invalid property {key}: {reason}")]
    InvalidProperty { key: String, reason: String },

    #[error("id map length mismatch: {logical} logical ids, {store} store ids")]
    LengthMismatch { logical: usize, store: usize },

    #[error("serialization error: {0}")]
    Serialization(String),
}
