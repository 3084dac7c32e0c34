use std::path::Path;

use dsync_types::Document;

use crate::error::{PackError, PackResult};
use crate::writer::decode_varint;
use crate::{MAGIC, VERSION};

/// Fixed header size: magic + version + count.
const FIXED_HEADER: usize = 12;
const TRAILER: usize = 32;

/// Read and decode an archive file.
pub fn read_archive(path: &Path) -> PackResult<Vec<Document>> {
    let data = std::fs::read(path)?;
    decode_archive(&data)
}

/// Decode archive bytes into the bundled documents, verifying every checksum.
pub fn decode_archive(data: &[u8]) -> PackResult<Vec<Document>> {
    if data.len() < FIXED_HEADER + TRAILER {
        return Err(PackError::Corrupt {
            offset: 0,
            reason: "archive too short".into(),
        });
    }
    if &data[0..4] != MAGIC {
        return Err(PackError::InvalidMagic {
            expected: String::from_utf8_lossy(MAGIC).into(),
            actual: String::from_utf8_lossy(&data[0..4]).into(),
        });
    }
    let version = read_u32(data, 4);
    if version != VERSION {
        return Err(PackError::UnsupportedVersion(version));
    }

    let body_end = data.len() - TRAILER;
    if blake3::hash(&data[..body_end]).as_bytes() != &data[body_end..] {
        return Err(PackError::ChecksumMismatch);
    }

    let count = read_u32(data, 8);
    let mut pos = FIXED_HEADER;
    let (raw_size, n) = decode_varint(&data[pos..body_end], pos)?;
    pos += n;
    let (compressed_size, n) = decode_varint(&data[pos..body_end], pos)?;
    pos += n;

    if pos + 4 > body_end {
        return Err(PackError::Corrupt {
            offset: pos,
            reason: "missing payload CRC".into(),
        });
    }
    let crc = read_u32(data, pos);
    pos += 4;

    let end = pos + compressed_size as usize;
    if end != body_end {
        return Err(PackError::Corrupt {
            offset: pos,
            reason: format!(
                "payload length {compressed_size} does not match archive body ({} bytes)",
                body_end - pos
            ),
        });
    }
    let compressed = &data[pos..end];
    if crc32fast::hash(compressed) != crc {
        return Err(PackError::CrcMismatch);
    }

    let payload = zstd::decode_all(compressed)
        .map_err(|e| PackError::DecompressionFailed(e.to_string()))?;
    if payload.len() as u64 != raw_size {
        return Err(PackError::Corrupt {
            offset: pos,
            reason: format!("expected {raw_size} payload bytes, got {}", payload.len()),
        });
    }

    let documents: Vec<Document> =
        serde_json::from_slice(&payload).map_err(|e| PackError::Serialization(e.to_string()))?;
    if documents.len() != count as usize {
        return Err(PackError::CountMismatch {
            expected: count,
            actual: documents.len(),
        });
    }
    Ok(documents)
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&data[at..at + 4]);
    u32::from_be_bytes(buf)
}
