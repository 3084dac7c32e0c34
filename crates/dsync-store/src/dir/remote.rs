use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use dsync_types::{Document, LogicalId, RemoteDatasetId, RemoteIdMap, RemoteRecord, StoreId};

use super::{check_name, id_component, json_files_sorted, read_json, write_atomic, write_json};
use crate::error::{StoreError, StoreResult};
use crate::traits::RemoteStore;

const RECORDS_DIR: &str = "records";
const FILES_DIR: &str = "files";

/// A remote service simulated in a directory tree.
///
/// ```text
/// <root>/<dataset>/records/<store id>.json
/// <root>/<dataset>/files/<hex logical id>/<name>
/// ```
///
/// Store ids are time-ordered UUIDv7 values, so listing order follows
/// upload order.
#[derive(Debug, Clone)]
pub struct DirRemoteStore {
    root: PathBuf,
}

impl DirRemoteStore {
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create an empty dataset (no-op if it exists).
    pub fn create_dataset(&self, dataset: &RemoteDatasetId) -> StoreResult<()> {
        let dir = self.root.join(check_name(dataset.as_str())?);
        fs::create_dir_all(dir.join(RECORDS_DIR))?;
        fs::create_dir_all(dir.join(FILES_DIR))?;
        Ok(())
    }

    /// Every dataset present, sorted.
    pub fn datasets(&self) -> StoreResult<Vec<RemoteDatasetId>> {
        let mut out = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| StoreError::Io(e.into()))?;
            if entry.file_type().is_dir() {
                out.push(RemoteDatasetId::parse(
                    entry.file_name().to_string_lossy().into_owned(),
                )?);
            }
        }
        Ok(out)
    }

    fn dataset_dir(&self, dataset: &RemoteDatasetId) -> StoreResult<PathBuf> {
        let dir = self.root.join(check_name(dataset.as_str())?);
        if !dir.join(RECORDS_DIR).is_dir() {
            return Err(StoreError::DatasetNotFound(dataset.clone()));
        }
        Ok(dir)
    }

    fn record_path(&self, dataset: &RemoteDatasetId, store_id: &StoreId) -> StoreResult<PathBuf> {
        Ok(self
            .dataset_dir(dataset)?
            .join(RECORDS_DIR)
            .join(format!("{}.json", check_name(store_id.as_str())?)))
    }

    fn file_path(
        &self,
        dataset: &RemoteDatasetId,
        logical_id: &LogicalId,
        name: &str,
    ) -> StoreResult<PathBuf> {
        Ok(self
            .dataset_dir(dataset)?
            .join(FILES_DIR)
            .join(id_component(logical_id))
            .join(check_name(name)?))
    }

    fn store(&self, dataset: &RemoteDatasetId, document: &Document) -> StoreResult<StoreId> {
        let store_id = StoreId::from(uuid::Uuid::now_v7().simple().to_string());
        let record = RemoteRecord::from_document(store_id.clone(), document);
        write_json(&self.record_path(dataset, &store_id)?, &record)?;
        Ok(store_id)
    }
}

impl RemoteStore for DirRemoteStore {
    fn list_document_ids(&self, dataset: &RemoteDatasetId) -> StoreResult<RemoteIdMap> {
        let dir = self.dataset_dir(dataset)?.join(RECORDS_DIR);
        let mut map = RemoteIdMap::new();
        for path in json_files_sorted(&dir) {
            let record: RemoteRecord = read_json(&path)?;
            let doc = record.into_document()?;
            let store_id = path
                .file_stem()
                .map(|s| StoreId::from(s.to_string_lossy().into_owned()))
                .ok_or_else(|| StoreError::Corrupt {
                    path: path.clone(),
                    reason: "record file has no name".into(),
                })?;
            map.push(doc.logical_id, store_id);
        }
        Ok(map)
    }

    fn get_document(
        &self,
        dataset: &RemoteDatasetId,
        store_id: &StoreId,
    ) -> StoreResult<Option<RemoteRecord>> {
        let path = self.record_path(dataset, store_id)?;
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    fn delete_documents(
        &self,
        dataset: &RemoteDatasetId,
        store_ids: &[StoreId],
    ) -> StoreResult<()> {
        for id in store_ids {
            let path = self.record_path(dataset, id)?;
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        debug!(dataset = %dataset, count = store_ids.len(), "deleted records");
        Ok(())
    }

    fn upload_document(
        &self,
        dataset: &RemoteDatasetId,
        document: &Document,
    ) -> StoreResult<StoreId> {
        self.store(dataset, document)
    }

    fn upload_archive(
        &self,
        dataset: &RemoteDatasetId,
        archive: &Path,
    ) -> StoreResult<Vec<StoreId>> {
        self.dataset_dir(dataset)?;
        let documents = dsync_pack::read_archive(archive)?;
        let ids = documents
            .iter()
            .map(|doc| self.store(dataset, doc))
            .collect::<StoreResult<Vec<_>>>()?;
        debug!(dataset = %dataset, count = ids.len(), "stored archive");
        Ok(ids)
    }

    fn put_file(
        &self,
        dataset: &RemoteDatasetId,
        logical_id: &LogicalId,
        name: &str,
        content: &[u8],
    ) -> StoreResult<()> {
        write_atomic(&self.file_path(dataset, logical_id, name)?, content)
    }

    fn get_file(
        &self,
        dataset: &RemoteDatasetId,
        logical_id: &LogicalId,
        name: &str,
    ) -> StoreResult<Vec<u8>> {
        let path = self.file_path(dataset, logical_id, name)?;
        if !path.exists() {
            return Err(StoreError::FileNotFound {
                logical_id: logical_id.clone(),
                name: name.to_string(),
            });
        }
        Ok(fs::read(path)?)
    }
}
