//! In-memory sync index store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use dsync_types::DatasetPair;

use crate::error::IndexResult;
use crate::index::SyncIndex;
use crate::traits::IndexStore;

/// Holds indexes in a map and counts writes, so callers can assert that a
/// run did or did not persist state.
#[derive(Debug, Default)]
pub struct InMemoryIndexStore {
    indexes: RwLock<BTreeMap<DatasetPair, SyncIndex>>,
    writes: AtomicU64,
}

impl InMemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

impl IndexStore for InMemoryIndexStore {
    fn read(&self, pair: &DatasetPair) -> IndexResult<Option<SyncIndex>> {
        Ok(self
            .indexes
            .read()
            .expect("index lock poisoned")
            .get(pair)
            .cloned())
    }

    fn write(&self, pair: &DatasetPair, index: &SyncIndex) -> IndexResult<()> {
        self.indexes
            .write()
            .expect("index lock poisoned")
            .insert(pair.clone(), index.clone());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsync_types::LogicalId;

    #[test]
    fn writes_are_counted_and_readable() {
        let store = InMemoryIndexStore::new();
        let pair = DatasetPair::new("l".into(), "r".into());
        assert!(store.read(&pair).unwrap().is_none());

        let index = SyncIndex::new(vec![LogicalId::from("x")], Vec::new());
        store.write(&pair, &index).unwrap();
        assert_eq!(store.writes(), 1);
        assert_eq!(store.read(&pair).unwrap(), Some(index));
    }
}
