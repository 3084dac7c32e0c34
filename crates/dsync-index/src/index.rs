use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use dsync_types::LogicalId;

/// Id sets observed at the end of the last successful sync.
///
/// An absent index reads as two empty sets.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncIndex {
    #[serde(default)]
    pub local_document_ids_last_sync: BTreeSet<LogicalId>,
    #[serde(default)]
    pub remote_document_ids_last_sync: BTreeSet<LogicalId>,
}

impl SyncIndex {
    pub fn new<L, R>(local: L, remote: R) -> Self
    where
        L: IntoIterator<Item = LogicalId>,
        R: IntoIterator<Item = LogicalId>,
    {
        Self {
            local_document_ids_last_sync: local.into_iter().collect(),
            remote_document_ids_last_sync: remote.into_iter().collect(),
        }
    }

    /// Copy with the local marker replaced.
    pub fn with_local<I: IntoIterator<Item = LogicalId>>(&self, ids: I) -> Self {
        Self {
            local_document_ids_last_sync: ids.into_iter().collect(),
            remote_document_ids_last_sync: self.remote_document_ids_last_sync.clone(),
        }
    }

    /// Copy with the remote marker replaced.
    pub fn with_remote<I: IntoIterator<Item = LogicalId>>(&self, ids: I) -> Self {
        Self {
            local_document_ids_last_sync: self.local_document_ids_last_sync.clone(),
            remote_document_ids_last_sync: ids.into_iter().collect(),
        }
    }

    /// Returns `true` if both sets are empty (the first-sync baseline).
    pub fn is_empty(&self) -> bool {
        self.local_document_ids_last_sync.is_empty()
            && self.remote_document_ids_last_sync.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(names: &[&str]) -> Vec<LogicalId> {
        names.iter().map(|n| LogicalId::from(*n)).collect()
    }

    #[test]
    fn serialized_shape_is_two_sorted_arrays() {
        let index = SyncIndex::new(ids(&["b", "a"]), ids(&["c"]));
        let value = serde_json::to_value(&index).unwrap();
        assert_eq!(
            value,
            json!({
                "local_document_ids_last_sync": ["a", "b"],
                "remote_document_ids_last_sync": ["c"],
            })
        );
    }

    #[test]
    fn missing_fields_read_as_empty() {
        let index: SyncIndex = serde_json::from_value(json!({})).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn markers_replace_one_side() {
        let base = SyncIndex::new(ids(&["a"]), ids(&["r"]));
        let next = base.with_local(ids(&["a", "b"]));
        assert_eq!(next.local_document_ids_last_sync.len(), 2);
        assert_eq!(next.remote_document_ids_last_sync, base.remote_document_ids_last_sync);

        let next = base.with_remote(Vec::new());
        assert!(next.remote_document_ids_last_sync.is_empty());
        assert_eq!(next.local_document_ids_last_sync, base.local_document_ids_last_sync);
    }
}
