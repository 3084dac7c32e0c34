//! In-memory store backends.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use dsync_types::{
    DatasetId, Document, LogicalId, RemoteDatasetId, RemoteIdMap, RemoteLinkage, RemoteRecord,
    StoreId, LOGICAL_ID_KEY,
};

use crate::error::{StoreError, StoreResult};
use crate::traits::{LocalStore, RemoteStore};

// ---------------------------------------------------------------------------
// InMemoryLocalStore
// ---------------------------------------------------------------------------

/// In-memory local dataset. Documents are listed in logical-id order.
pub struct InMemoryLocalStore {
    dataset: DatasetId,
    documents: RwLock<BTreeMap<LogicalId, Document>>,
    files: RwLock<BTreeMap<(LogicalId, String), Vec<u8>>>,
    linkages: RwLock<Vec<RemoteLinkage>>,
}

impl InMemoryLocalStore {
    /// Create an empty dataset.
    pub fn new(dataset: impl Into<DatasetId>) -> Self {
        Self {
            dataset: dataset.into(),
            documents: RwLock::new(BTreeMap::new()),
            files: RwLock::new(BTreeMap::new()),
            linkages: RwLock::new(Vec::new()),
        }
    }

    /// Create a dataset pre-populated with `documents`.
    pub fn with_documents(dataset: impl Into<DatasetId>, documents: Vec<Document>) -> Self {
        let store = Self::new(dataset);
        {
            let mut map = store.documents.write().expect("lock poisoned");
            for doc in documents {
                map.insert(doc.logical_id.clone(), doc);
            }
        }
        store
    }

    /// Sorted logical ids currently held.
    pub fn ids(&self) -> Vec<LogicalId> {
        self.documents
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    /// Fetch one document.
    pub fn get(&self, logical_id: &LogicalId) -> Option<Document> {
        self.documents
            .read()
            .expect("lock poisoned")
            .get(logical_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.documents.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().expect("lock poisoned").is_empty()
    }
}

impl LocalStore for InMemoryLocalStore {
    fn dataset_id(&self) -> &DatasetId {
        &self.dataset
    }

    fn list_documents(&self) -> StoreResult<(Vec<Document>, Vec<LogicalId>)> {
        let map = self.documents.read().expect("lock poisoned");
        let docs: Vec<Document> = map.values().cloned().collect();
        let ids = map.keys().cloned().collect();
        Ok((docs, ids))
    }

    fn add(&self, document: &Document) -> StoreResult<()> {
        self.documents
            .write()
            .expect("lock poisoned")
            .insert(document.logical_id.clone(), document.clone());
        Ok(())
    }

    fn remove(&self, logical_id: &LogicalId) -> StoreResult<bool> {
        let existed = self
            .documents
            .write()
            .expect("lock poisoned")
            .remove(logical_id)
            .is_some();
        self.files
            .write()
            .expect("lock poisoned")
            .retain(|(id, _), _| id != logical_id);
        Ok(existed)
    }

    fn read_file(&self, logical_id: &LogicalId, name: &str) -> StoreResult<Vec<u8>> {
        self.files
            .read()
            .expect("lock poisoned")
            .get(&(logical_id.clone(), name.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::FileNotFound {
                logical_id: logical_id.clone(),
                name: name.to_string(),
            })
    }

    fn write_file(&self, logical_id: &LogicalId, name: &str, content: &[u8]) -> StoreResult<()> {
        self.files
            .write()
            .expect("lock poisoned")
            .insert((logical_id.clone(), name.to_string()), content.to_vec());
        Ok(())
    }

    fn linkage_records(&self) -> StoreResult<Vec<RemoteLinkage>> {
        Ok(self.linkages.read().expect("lock poisoned").clone())
    }

    fn add_linkage(&self, record: &RemoteLinkage) -> StoreResult<()> {
        self.linkages
            .write()
            .expect("lock poisoned")
            .push(record.clone());
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryLocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLocalStore")
            .field("dataset", &self.dataset)
            .field("document_count", &self.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// InMemoryRemoteStore
// ---------------------------------------------------------------------------

/// Counts of calls made against an [`InMemoryRemoteStore`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallStats {
    pub lists: u64,
    pub gets: u64,
    pub bulk_downloads: u64,
    /// Upload calls (single documents and archives alike).
    pub uploads: u64,
    pub documents_uploaded: u64,
    pub delete_calls: u64,
    pub documents_deleted: u64,
    pub files_put: u64,
}

impl CallStats {
    /// Total calls that changed remote state.
    pub fn mutations(&self) -> u64 {
        self.uploads + self.delete_calls + self.files_put
    }
}

#[derive(Default)]
struct Faults {
    /// Remaining successful upload calls before uploads start failing.
    upload_budget: Option<u64>,
    fail_deletes: bool,
    fail_bulk_download: bool,
    fail_gets: Vec<StoreId>,
}

#[derive(Default)]
struct RemoteDataset {
    records: Vec<RemoteRecord>,
    files: BTreeMap<(LogicalId, String), Vec<u8>>,
}

/// In-memory remote service.
///
/// Records keep insertion order, and the same logical id may appear under
/// several store ids (as a real remote may hold after a retried upload).
/// Store ids are 24-digit zero-padded hex counters, so later uploads sort
/// after earlier ones.
pub struct InMemoryRemoteStore {
    datasets: RwLock<BTreeMap<RemoteDatasetId, RemoteDataset>>,
    next_id: AtomicU64,
    faults: RwLock<Faults>,
    stats: RwLock<CallStats>,
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self {
            datasets: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            faults: RwLock::new(Faults::default()),
            stats: RwLock::new(CallStats::default()),
        }
    }

    /// Create an empty dataset (no-op if it exists).
    pub fn create_dataset(&self, dataset: &RemoteDatasetId) {
        self.datasets
            .write()
            .expect("lock poisoned")
            .entry(dataset.clone())
            .or_default();
    }

    /// Insert a record with a caller-chosen store id, bypassing accounting.
    pub fn insert_record(&self, dataset: &RemoteDatasetId, store_id: StoreId, document: &Document) {
        let mut map = self.datasets.write().expect("lock poisoned");
        map.entry(dataset.clone())
            .or_default()
            .records
            .push(RemoteRecord::from_document(store_id, document));
    }

    /// All records in a dataset, in insertion order.
    pub fn records(&self, dataset: &RemoteDatasetId) -> Vec<RemoteRecord> {
        self.datasets
            .read()
            .expect("lock poisoned")
            .get(dataset)
            .map(|d| d.records.clone())
            .unwrap_or_default()
    }

    /// Sorted, de-duplicated logical ids in a dataset.
    pub fn ids(&self, dataset: &RemoteDatasetId) -> Vec<LogicalId> {
        let mut ids: Vec<LogicalId> = self
            .records(dataset)
            .iter()
            .filter_map(|r| logical_id_of(r).ok())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Stored attachment bytes, if present.
    pub fn file(&self, dataset: &RemoteDatasetId, logical_id: &LogicalId, name: &str) -> Option<Vec<u8>> {
        self.datasets
            .read()
            .expect("lock poisoned")
            .get(dataset)?
            .files
            .get(&(logical_id.clone(), name.to_string()))
            .cloned()
    }

    /// Allow `n` more upload calls, then fail every later one.
    pub fn fail_upload_after(&self, n: u64) {
        self.faults.write().expect("lock poisoned").upload_budget = Some(n);
    }

    /// Make every delete call fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.faults.write().expect("lock poisoned").fail_deletes = fail;
    }

    /// Make bulk downloads fail.
    pub fn fail_bulk_download(&self, fail: bool) {
        self.faults.write().expect("lock poisoned").fail_bulk_download = fail;
    }

    /// Make `get_document` fail for one store id.
    pub fn fail_get(&self, store_id: StoreId) {
        self.faults
            .write()
            .expect("lock poisoned")
            .fail_gets
            .push(store_id);
    }

    /// Remove all injected faults.
    pub fn clear_faults(&self) {
        *self.faults.write().expect("lock poisoned") = Faults::default();
    }

    /// Snapshot of call counters.
    pub fn stats(&self) -> CallStats {
        self.stats.read().expect("lock poisoned").clone()
    }

    pub fn reset_stats(&self) {
        *self.stats.write().expect("lock poisoned") = CallStats::default();
    }

    fn next_store_id(&self) -> StoreId {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        StoreId::from(format!("{n:024x}"))
    }

    fn take_upload_permit(&self) -> StoreResult<()> {
        let mut faults = self.faults.write().expect("lock poisoned");
        match faults.upload_budget {
            Some(0) => Err(StoreError::Rejected("upload refused by remote".into())),
            Some(ref mut n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn with_dataset<T>(
        &self,
        dataset: &RemoteDatasetId,
        f: impl FnOnce(&mut RemoteDataset) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut map = self.datasets.write().expect("lock poisoned");
        let ds = map
            .get_mut(dataset)
            .ok_or_else(|| StoreError::DatasetNotFound(dataset.clone()))?;
        f(ds)
    }

    fn bump(&self, f: impl FnOnce(&mut CallStats)) {
        f(&mut self.stats.write().expect("lock poisoned"));
    }
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

fn logical_id_of(record: &RemoteRecord) -> StoreResult<LogicalId> {
    match record.properties.get(LOGICAL_ID_KEY) {
        Some(serde_json::Value::String(s)) => Ok(LogicalId::parse(s.clone())?),
        _ => Err(StoreError::Serialization(format!(
            "record {} has no logical id",
            record.store_id
        ))),
    }
}

impl RemoteStore for InMemoryRemoteStore {
    fn list_document_ids(&self, dataset: &RemoteDatasetId) -> StoreResult<RemoteIdMap> {
        self.bump(|s| s.lists += 1);
        let map = self.datasets.read().expect("lock poisoned");
        let ds = map
            .get(dataset)
            .ok_or_else(|| StoreError::DatasetNotFound(dataset.clone()))?;
        let mut ids = RemoteIdMap::new();
        for record in &ds.records {
            ids.push(logical_id_of(record)?, record.store_id.clone());
        }
        Ok(ids)
    }

    fn get_document(
        &self,
        dataset: &RemoteDatasetId,
        store_id: &StoreId,
    ) -> StoreResult<Option<RemoteRecord>> {
        self.bump(|s| s.gets += 1);
        if self
            .faults
            .read()
            .expect("lock poisoned")
            .fail_gets
            .contains(store_id)
        {
            return Err(StoreError::Rejected(format!("get {store_id} failed")));
        }
        let map = self.datasets.read().expect("lock poisoned");
        let ds = map
            .get(dataset)
            .ok_or_else(|| StoreError::DatasetNotFound(dataset.clone()))?;
        Ok(ds.records.iter().find(|r| &r.store_id == store_id).cloned())
    }

    fn download_document_collection(
        &self,
        dataset: &RemoteDatasetId,
        store_ids: &[StoreId],
    ) -> StoreResult<Vec<RemoteRecord>> {
        self.bump(|s| s.bulk_downloads += 1);
        if self.faults.read().expect("lock poisoned").fail_bulk_download {
            return Err(StoreError::Rejected("bulk download failed".into()));
        }
        let map = self.datasets.read().expect("lock poisoned");
        let ds = map
            .get(dataset)
            .ok_or_else(|| StoreError::DatasetNotFound(dataset.clone()))?;
        Ok(store_ids
            .iter()
            .filter_map(|id| ds.records.iter().find(|r| &r.store_id == id).cloned())
            .collect())
    }

    fn delete_documents(
        &self,
        dataset: &RemoteDatasetId,
        store_ids: &[StoreId],
    ) -> StoreResult<()> {
        self.bump(|s| s.delete_calls += 1);
        if self.faults.read().expect("lock poisoned").fail_deletes {
            return Err(StoreError::Rejected("delete refused by remote".into()));
        }
        let removed = self.with_dataset(dataset, |ds| {
            let before = ds.records.len();
            ds.records.retain(|r| !store_ids.contains(&r.store_id));
            Ok((before - ds.records.len()) as u64)
        })?;
        self.bump(|s| s.documents_deleted += removed);
        Ok(())
    }

    fn upload_document(
        &self,
        dataset: &RemoteDatasetId,
        document: &Document,
    ) -> StoreResult<StoreId> {
        self.bump(|s| s.uploads += 1);
        self.take_upload_permit()?;
        let store_id = self.next_store_id();
        self.with_dataset(dataset, |ds| {
            ds.records
                .push(RemoteRecord::from_document(store_id.clone(), document));
            Ok(())
        })?;
        self.bump(|s| s.documents_uploaded += 1);
        Ok(store_id)
    }

    fn upload_archive(
        &self,
        dataset: &RemoteDatasetId,
        archive: &Path,
    ) -> StoreResult<Vec<StoreId>> {
        self.bump(|s| s.uploads += 1);
        self.take_upload_permit()?;
        let documents = dsync_pack::read_archive(archive)?;
        let ids: Vec<StoreId> = documents.iter().map(|_| self.next_store_id()).collect();
        self.with_dataset(dataset, |ds| {
            for (doc, id) in documents.iter().zip(&ids) {
                ds.records.push(RemoteRecord::from_document(id.clone(), doc));
            }
            Ok(())
        })?;
        self.bump(|s| s.documents_uploaded += ids.len() as u64);
        Ok(ids)
    }

    fn put_file(
        &self,
        dataset: &RemoteDatasetId,
        logical_id: &LogicalId,
        name: &str,
        content: &[u8],
    ) -> StoreResult<()> {
        self.bump(|s| s.files_put += 1);
        self.with_dataset(dataset, |ds| {
            ds.files
                .insert((logical_id.clone(), name.to_string()), content.to_vec());
            Ok(())
        })
    }

    fn get_file(
        &self,
        dataset: &RemoteDatasetId,
        logical_id: &LogicalId,
        name: &str,
    ) -> StoreResult<Vec<u8>> {
        self.with_dataset(dataset, |ds| {
            ds.files
                .get(&(logical_id.clone(), name.to_string()))
                .cloned()
                .ok_or_else(|| StoreError::FileNotFound {
                    logical_id: logical_id.clone(),
                    name: name.to_string(),
                })
        })
    }
}

impl std::fmt::Debug for InMemoryRemoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.datasets.read().expect("lock poisoned").len();
        f.debug_struct("InMemoryRemoteStore")
            .field("dataset_count", &count)
            .finish()
    }
}
