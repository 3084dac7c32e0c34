use dsync_diff::{diff_ids, missing_from};
use dsync_index::SyncIndex;
use dsync_types::{DatasetPair, LogicalId, RemoteIdMap};

use crate::duplicates::find_duplicates;

/// Read-only summary of where a dataset pair stands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncStatus {
    pub pair: DatasetPair,
    pub local_only: Vec<LogicalId>,
    pub remote_only: Vec<LogicalId>,
    pub common: Vec<LogicalId>,
    /// Extra remote records beyond one per logical id.
    pub remote_duplicates: usize,
    /// `None` before the first successful sync.
    pub baseline: Option<SyncIndex>,
    pub new_local_since_sync: Vec<LogicalId>,
    pub new_remote_since_sync: Vec<LogicalId>,
}

impl SyncStatus {
    pub(crate) fn compute(
        pair: DatasetPair,
        local: &[LogicalId],
        remote: &RemoteIdMap,
        baseline: Option<SyncIndex>,
    ) -> Self {
        let diff = diff_ids(local, remote);
        let empty = SyncIndex::default();
        let base = baseline.as_ref().unwrap_or(&empty);
        Self {
            pair,
            local_only: diff.upload,
            remote_only: diff.download.logical_ids().to_vec(),
            common: diff.common,
            remote_duplicates: find_duplicates(remote).duplicate_count(),
            new_local_since_sync: missing_from(local, &base.local_document_ids_last_sync),
            new_remote_since_sync: missing_from(
                remote.dedup_logical().logical_ids(),
                &base.remote_document_ids_last_sync,
            ),
            baseline,
        }
    }

    pub fn is_in_sync(&self) -> bool {
        self.local_only.is_empty() && self.remote_only.is_empty() && self.remote_duplicates == 0
    }
}
