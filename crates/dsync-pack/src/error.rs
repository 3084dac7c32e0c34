use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("invalid archive magic: expected {expected}, got {actual}")]
    InvalidMagic { expected: String, actual: String },

    #[error("unsupported archive version: {0}")]
    UnsupportedVersion(u32),

    #[error("archive checksum mismatch")]
    ChecksumMismatch,

    #[error("CRC32 mismatch on archive payload")]
    CrcMismatch,

    #[error("corrupt archive at offset {offset}: {reason}")]
    Corrupt { offset: usize, reason: String },

    #[error("document count mismatch: header says {expected}, payload has {actual}")]
    CountMismatch { expected: u32, actual: usize },

    #[error("compression failed: {0}")]
    CompressionFailed(String),

    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type PackResult<T> = Result<T, PackError>;
