//! Directory-backed stores.
//!
//! Both backends keep one JSON file per document and write every file
//! through a temporary sibling that is renamed into place, so a crash never
//! leaves a half-written document behind.

mod local;
mod remote;

pub use local::DirLocalStore;
pub use remote::DirRemoteStore;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use dsync_types::LogicalId;

use crate::error::{StoreError, StoreResult};

const JSON_EXT: &str = "json";

/// Write `bytes` to `path` atomically.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let parent = path
        .parent()
        .ok_or_else(|| StoreError::InvalidName(path.display().to_string()))?;
    fs::create_dir_all(parent)?;
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    write_atomic(path, &bytes)
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<T> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Like [`read_json`], but a missing file reads as `None`.
pub(crate) fn read_json_opt<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    read_json(path).map(Some)
}

/// Reject names that would escape their directory.
pub(crate) fn check_name(name: &str) -> StoreResult<&str> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(name)
}

/// Path component for a logical id. Hex keeps arbitrary ids filesystem-safe
/// and preserves their byte order.
pub(crate) fn id_component(id: &LogicalId) -> String {
    hex::encode(id.as_str())
}

/// `*.json` files directly under `dir`, sorted by name.
pub(crate) fn json_files_sorted(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == JSON_EXT))
        .collect();
    files.sort();
    files
}
