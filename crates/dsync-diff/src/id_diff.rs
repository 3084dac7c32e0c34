//! Id-set reconciliation.
//!
//! The diff is computed on sets but returned in source order: each output
//! sequence is the corresponding input sequence filtered by membership, so
//! callers can recover documents (or store ids) positionally.

use std::collections::BTreeSet;

use dsync_types::{Document, LogicalId, RemoteIdMap};

/// The result of comparing a local id listing with a remote one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdDiff {
    /// Local ids absent from the remote (`L \ R`), in local order.
    pub upload: Vec<LogicalId>,
    /// Remote pairs whose logical id is absent locally (`R \ L`), in remote
    /// order, one pair per logical id.
    pub download: RemoteIdMap,
    /// Ids present on both sides (`L ∩ R`), in local order.
    pub common: Vec<LogicalId>,
}

impl IdDiff {
    /// Returns `true` if neither side has anything the other lacks.
    pub fn is_converged(&self) -> bool {
        self.upload.is_empty() && self.download.is_empty()
    }
}

/// Compare local ids against a remote listing.
pub fn diff_ids(local: &[LogicalId], remote: &RemoteIdMap) -> IdDiff {
    let local_set: BTreeSet<&LogicalId> = local.iter().collect();
    let remote_set: BTreeSet<&LogicalId> = remote.logical_ids().iter().collect();

    let mut seen = BTreeSet::new();
    let mut upload = Vec::new();
    let mut common = Vec::new();
    for id in local {
        if !seen.insert(id) {
            continue;
        }
        if remote_set.contains(id) {
            common.push(id.clone());
        } else {
            upload.push(id.clone());
        }
    }

    let download = remote
        .filter(|l, _| !local_set.contains(l))
        .dedup_logical();

    IdDiff {
        upload,
        download,
        common,
    }
}

/// Ids in `ids` that are not in `baseline`, in source order, without repeats.
pub fn missing_from(ids: &[LogicalId], baseline: &BTreeSet<LogicalId>) -> Vec<LogicalId> {
    let mut seen = BTreeSet::new();
    ids.iter()
        .filter(|id| !baseline.contains(*id) && seen.insert(*id))
        .cloned()
        .collect()
}

/// Remote pairs whose logical id is not in `baseline`, one per logical id.
pub fn remote_missing_from(remote: &RemoteIdMap, baseline: &BTreeSet<LogicalId>) -> RemoteIdMap {
    remote.filter(|l, _| !baseline.contains(l)).dedup_logical()
}

/// Every remote pair whose logical id is not in `keep`, duplicates included.
/// These are the records a mirror must delete.
pub fn remote_extras(remote: &RemoteIdMap, keep: &[LogicalId]) -> RemoteIdMap {
    let keep: BTreeSet<&LogicalId> = keep.iter().collect();
    remote.filter(|l, _| !keep.contains(l))
}

/// Documents whose logical id is in `ids`, in source order.
pub fn select_documents(documents: &[Document], ids: &[LogicalId]) -> Vec<Document> {
    let wanted: BTreeSet<&LogicalId> = ids.iter().collect();
    documents
        .iter()
        .filter(|d| wanted.contains(&d.logical_id))
        .cloned()
        .collect()
}
