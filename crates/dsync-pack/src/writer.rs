use std::io::Write;
use std::path::{Path, PathBuf};

use dsync_types::{Document, LogicalId};
use tempfile::NamedTempFile;

use crate::error::{PackError, PackResult};
use crate::{MAGIC, VERSION};

/// zstd level used for archive payloads.
const COMPRESSION_LEVEL: i32 = 3;

/// A chunk archive on disk.
///
/// Owns its temporary file: dropping the archive deletes the file, so an
/// archive created for an upload never outlives the call that used it.
#[derive(Debug)]
pub struct ChunkArchive {
    file: NamedTempFile,
    ids: Vec<LogicalId>,
    size: u64,
    checksum: [u8; 32],
}

impl ChunkArchive {
    /// Path of the archive file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Logical ids of the bundled documents, in archive order.
    pub fn ids(&self) -> &[LogicalId] {
        &self.ids
    }

    pub fn document_count(&self) -> usize {
        self.ids.len()
    }

    /// Size of the archive file in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// BLAKE3 trailer checksum.
    pub fn checksum(&self) -> [u8; 32] {
        self.checksum
    }

    /// Delete the archive file now, surfacing any removal error.
    pub fn close(self) -> PackResult<()> {
        self.file.close()?;
        Ok(())
    }
}

/// Builds a chunk archive from documents.
pub struct ArchiveWriter {
    dir: Option<PathBuf>,
    documents: Vec<Document>,
}

impl ArchiveWriter {
    /// A writer whose archive goes to the system temporary directory.
    pub fn new() -> Self {
        Self {
            dir: None,
            documents: Vec::new(),
        }
    }

    /// A writer whose archive goes to `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            dir: Some(dir.to_path_buf()),
            documents: Vec::new(),
        }
    }

    /// Queue one document.
    pub fn add(&mut self, document: &Document) {
        self.documents.push(document.clone());
    }

    /// Queue several documents, preserving order.
    pub fn extend(&mut self, documents: &[Document]) {
        self.documents.extend_from_slice(documents);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Write the archive to a fresh temporary file.
    pub fn finish(self) -> PackResult<ChunkArchive> {
        let ids: Vec<LogicalId> = self
            .documents
            .iter()
            .map(|d| d.logical_id.clone())
            .collect();

        let mut builder = tempfile::Builder::new();
        builder.prefix("dsync-chunk-").suffix(".dsa");
        let mut file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        let bytes = build_archive_bytes(&self.documents)?;
        file.write_all(&bytes)?;
        file.flush()?;

        let mut checksum = [0u8; 32];
        checksum.copy_from_slice(&bytes[bytes.len() - 32..]);

        tracing::debug!(
            path = ?file.path(),
            documents = ids.len(),
            bytes = bytes.len(),
            "chunk archive written"
        );

        Ok(ChunkArchive {
            file,
            ids,
            size: bytes.len() as u64,
            checksum,
        })
    }

    /// Build the archive in memory (no disk I/O).
    pub fn finish_to_bytes(self) -> PackResult<Vec<u8>> {
        build_archive_bytes(&self.documents)
    }
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn build_archive_bytes(documents: &[Document]) -> PackResult<Vec<u8>> {
    let payload =
        serde_json::to_vec(documents).map_err(|e| PackError::Serialization(e.to_string()))?;
    let compressed = zstd::encode_all(payload.as_slice(), COMPRESSION_LEVEL)
        .map_err(|e| PackError::CompressionFailed(e.to_string()))?;

    let mut data = Vec::with_capacity(compressed.len() + 64);
    data.extend_from_slice(MAGIC);
    data.extend_from_slice(&VERSION.to_be_bytes());
    data.extend_from_slice(&(documents.len() as u32).to_be_bytes());
    encode_varint(&mut data, payload.len() as u64);
    encode_varint(&mut data, compressed.len() as u64);
    data.extend_from_slice(&crc32fast::hash(&compressed).to_be_bytes());
    data.extend_from_slice(&compressed);

    let checksum = *blake3::hash(&data).as_bytes();
    data.extend_from_slice(&checksum);
    Ok(data)
}

/// Encode a u64 as a variable-length integer.
pub(crate) fn encode_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Decode a variable-length integer. Returns (value, bytes_consumed).
pub(crate) fn decode_varint(data: &[u8], offset: usize) -> PackResult<(u64, usize)> {
    let mut value: u64 = 0;
    let mut shift = 0;
    for (i, &byte) in data.iter().enumerate() {
        value |= ((byte & 0x7F) as u64) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
        if shift >= 64 {
            return Err(PackError::Corrupt {
                offset,
                reason: "varint overflow".into(),
            });
        }
    }
    Err(PackError::Corrupt {
        offset,
        reason: "truncated varint".into(),
    })
}
