//! Chunk archive format for dsync.
//!
//! A chunk archive bundles an ordered list of documents for a single bulk
//! upload call: the documents are serialized as a JSON array, compressed
//! with zstd, and framed with a header, a CRC32 of the compressed payload,
//! and a BLAKE3 trailer over the whole file.
//!
//! # Layout
//!
//! ```text
//! [4 bytes: magic "DSYA"]
//! [4 bytes: version (big-endian u32)]
//! [4 bytes: document count (big-endian u32)]
//! [varint: uncompressed payload size]
//! [varint: compressed payload size]
//! [4 bytes: CRC32 of compressed payload (big-endian u32)]
//! [N bytes: zstd(JSON array of documents)]
//! [32 bytes: BLAKE3 of everything above]
//! ```
//!
//! Archives written by [`ArchiveWriter::finish`] live in a temporary file
//! owned by the returned [`ChunkArchive`]; the file is removed when the
//! archive is dropped, on success and failure paths alike.

pub mod error;
pub mod reader;
pub mod writer;

pub use error::{PackError, PackResult};
pub use reader::{decode_archive, read_archive};
pub use writer::{ArchiveWriter, ChunkArchive};

/// Archive magic bytes.
pub const MAGIC: &[u8; 4] = b"DSYA";
/// Current archive format version.
pub const VERSION: u32 = 1;
