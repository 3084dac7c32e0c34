//! Explicit memoization of remote listings.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use dsync_types::{RemoteDatasetId, RemoteIdMap};

use crate::error::StoreResult;
use crate::traits::RemoteStore;

/// Caches [`RemoteStore::list_document_ids`] results per dataset.
///
/// Owned by whoever drives the remote store and passed by reference. Any
/// code that mutates a remote dataset must call [`invalidate`](Self::invalidate)
/// for it before the next listing is trusted.
#[derive(Debug, Default)]
pub struct RemoteListingCache {
    entries: RwLock<BTreeMap<RemoteDatasetId, RemoteIdMap>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RemoteListingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// List through the cache.
    pub fn list(
        &self,
        remote: &dyn RemoteStore,
        dataset: &RemoteDatasetId,
    ) -> StoreResult<RemoteIdMap> {
        if let Some(map) = self
            .entries
            .read()
            .expect("cache lock poisoned")
            .get(dataset)
        {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(map.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let map = remote.list_document_ids(dataset)?;
        self.entries
            .write()
            .expect("cache lock poisoned")
            .insert(dataset.clone(), map.clone());
        Ok(map)
    }

    /// Drop the cached listing for one dataset.
    pub fn invalidate(&self, dataset: &RemoteDatasetId) {
        self.entries
            .write()
            .expect("cache lock poisoned")
            .remove(dataset);
    }

    /// Drop every cached listing.
    pub fn clear(&self) {
        self.entries.write().expect("cache lock poisoned").clear();
    }

    /// Returns `true` if a listing for `dataset` is cached.
    pub fn contains(&self, dataset: &RemoteDatasetId) -> bool {
        self.entries
            .read()
            .expect("cache lock poisoned")
            .contains_key(dataset)
    }

    /// (hits, misses) since creation.
    pub fn counters(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}
