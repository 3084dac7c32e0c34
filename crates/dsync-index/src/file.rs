//! File-backed sync index store.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use dsync_types::DatasetPair;

use crate::error::{IndexError, IndexResult};
use crate::index::SyncIndex;
use crate::traits::IndexStore;

/// Index files live at `<root>/.dsync/sync/<remote dataset>/index.json`,
/// where `root` is the local dataset directory.
#[derive(Debug, Clone)]
pub struct FileIndexStore {
    root: PathBuf,
}

impl FileIndexStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Location of the index for `pair`.
    pub fn path_for(&self, pair: &DatasetPair) -> IndexResult<PathBuf> {
        let remote = pair.remote.as_str();
        if remote == "." || remote == ".." || remote.contains(['/', '\\', '\0']) {
            return Err(IndexError::InvalidPair(pair.to_string()));
        }
        Ok(self
            .root
            .join(".dsync")
            .join("sync")
            .join(remote)
            .join("index.json"))
    }
}

impl IndexStore for FileIndexStore {
    fn read(&self, pair: &DatasetPair) -> IndexResult<Option<SyncIndex>> {
        let path = self.path_for(pair)?;
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        let index = serde_json::from_slice(&bytes).map_err(|e| IndexError::Corrupt {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Ok(Some(index))
    }

    fn write(&self, pair: &DatasetPair, index: &SyncIndex) -> IndexResult<()> {
        let path = self.path_for(pair)?;
        let dir = path
            .parent()
            .ok_or_else(|| IndexError::InvalidPair(pair.to_string()))?;
        fs::create_dir_all(dir)?;

        let bytes = serde_json::to_vec_pretty(index)
            .map_err(|e| IndexError::Serialization(e.to_string()))?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| IndexError::Io(e.error))?;

        debug!(
            pair = %pair,
            local = index.local_document_ids_last_sync.len(),
            remote = index.remote_document_ids_last_sync.len(),
            "wrote sync index"
        );
        Ok(())
    }
}
