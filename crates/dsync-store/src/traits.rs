use std::path::Path;

use dsync_types::{
    DatasetId, Document, LogicalId, RemoteDatasetId, RemoteIdMap, RemoteLinkage, RemoteRecord,
    StoreId,
};

use crate::error::StoreResult;

/// The local document store.
///
/// Implementations must be thread-safe (`Send + Sync`); all methods take
/// `&self` and use interior mutability where they write.
pub trait LocalStore: Send + Sync {
    /// Identity of the local dataset.
    fn dataset_id(&self) -> &DatasetId;

    /// List every document together with the parallel sequence of logical
    /// ids (`ids[i] == docs[i].logical_id`).
    fn list_documents(&self) -> StoreResult<(Vec<Document>, Vec<LogicalId>)>;

    /// Insert or replace a document.
    fn add(&self, document: &Document) -> StoreResult<()>;

    /// Remove a document and its attachments. Returns `true` if it existed.
    fn remove(&self, logical_id: &LogicalId) -> StoreResult<bool>;

    /// Read an attachment's bytes.
    fn read_file(&self, logical_id: &LogicalId, name: &str) -> StoreResult<Vec<u8>>;

    /// Write an attachment's bytes.
    fn write_file(&self, logical_id: &LogicalId, name: &str, content: &[u8]) -> StoreResult<()>;

    /// Linkage records naming remote counterparts of this dataset.
    fn linkage_records(&self) -> StoreResult<Vec<RemoteLinkage>>;

    /// Persist a linkage record.
    fn add_linkage(&self, record: &RemoteLinkage) -> StoreResult<()>;

    /// Logical ids only, in listing order.
    fn logical_ids(&self) -> StoreResult<Vec<LogicalId>> {
        Ok(self.list_documents()?.1)
    }
}

/// The remote document store.
///
/// Every call is a blocking round-trip. Timeouts and retries, if any, are
/// the implementation's concern.
pub trait RemoteStore: Send + Sync {
    /// List `(logical id, store id)` pairs for every record in the dataset.
    fn list_document_ids(&self, dataset: &RemoteDatasetId) -> StoreResult<RemoteIdMap>;

    /// Fetch one record. `Ok(None)` means the record does not exist.
    fn get_document(
        &self,
        dataset: &RemoteDatasetId,
        store_id: &StoreId,
    ) -> StoreResult<Option<RemoteRecord>>;

    /// Fetch many records in one request. Missing ids are omitted.
    ///
    /// The default implementation calls [`get_document`](Self::get_document)
    /// per id; backends with a bulk endpoint should override it.
    fn download_document_collection(
        &self,
        dataset: &RemoteDatasetId,
        store_ids: &[StoreId],
    ) -> StoreResult<Vec<RemoteRecord>> {
        let mut out = Vec::with_capacity(store_ids.len());
        for id in store_ids {
            if let Some(record) = self.get_document(dataset, id)? {
                out.push(record);
            }
        }
        Ok(out)
    }

    /// Delete records by store id.
    fn delete_documents(&self, dataset: &RemoteDatasetId, store_ids: &[StoreId])
        -> StoreResult<()>;

    /// Upload one document, returning its new store id.
    fn upload_document(&self, dataset: &RemoteDatasetId, document: &Document)
        -> StoreResult<StoreId>;

    /// Upload a chunk archive (see `dsync-pack`), returning the new store
    /// ids in archive order.
    fn upload_archive(&self, dataset: &RemoteDatasetId, archive: &Path)
        -> StoreResult<Vec<StoreId>>;

    /// Store an attachment for a document.
    fn put_file(
        &self,
        dataset: &RemoteDatasetId,
        logical_id: &LogicalId,
        name: &str,
        content: &[u8],
    ) -> StoreResult<()>;

    /// Fetch an attachment.
    fn get_file(
        &self,
        dataset: &RemoteDatasetId,
        logical_id: &LogicalId,
        name: &str,
    ) -> StoreResult<Vec<u8>>;
}
