//! Read-only comparison of local documents against their remote copies.
//!
//! The validator never mutates either store and always produces a report;
//! a remote that cannot be read is recorded per document, not raised.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use dsync_diff::{diff_properties, render_unified, strip_volatile, PropertyDiff, VOLATILE_KEYS};
use dsync_store::{LocalStore, RemoteListingCache, RemoteStore};
use dsync_types::{Document, LogicalId, RemoteDatasetId, RemoteIdMap, RemoteRecord, StoreId};

use crate::config::ValidationMode;
use crate::error::SyncResult;

/// Why a common document was flagged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MismatchReason {
    PropertiesDiffer,
    RemoteMissing,
    /// The remote call failed; carries the collaborator's message.
    RetrievalFailed(String),
}

impl fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PropertiesDiffer => "properties do not match",
            Self::RemoteMissing => "remote document could not be found",
            Self::RetrievalFailed(_) => "failed to retrieve remote document",
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Mismatch {
    pub logical_id: LogicalId,
    pub reason: MismatchReason,
    /// Key-level changes of the stripped snapshots. Empty unless the
    /// properties differ.
    pub diff: PropertyDiff,
    /// Unified text diff of the stripped snapshots.
    pub rendered: String,
}

/// Both snapshots of a mismatched document, with volatile keys removed.
#[derive(Clone, Debug, PartialEq)]
pub struct SnapshotPair {
    pub local: Map<String, Value>,
    pub remote: Option<Map<String, Value>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationReport {
    pub local_only: Vec<LogicalId>,
    pub remote_only: Vec<LogicalId>,
    pub common: Vec<LogicalId>,
    pub mismatched: Vec<LogicalId>,
    pub mismatch_details: Vec<Mismatch>,
    pub snapshots: BTreeMap<LogicalId, SnapshotPair>,
}

impl ValidationReport {
    /// No partition differences and no mismatches.
    pub fn is_clean(&self) -> bool {
        self.local_only.is_empty() && self.remote_only.is_empty() && self.mismatched.is_empty()
    }

    pub fn mismatch(&self, id: &LogicalId) -> Option<&Mismatch> {
        self.mismatch_details.iter().find(|m| &m.logical_id == id)
    }
}

pub struct Validator<'a> {
    local: &'a dyn LocalStore,
    remote: &'a dyn RemoteStore,
    cache: &'a RemoteListingCache,
    dataset: &'a RemoteDatasetId,
    mode: ValidationMode,
}

impl<'a> Validator<'a> {
    pub fn new(
        local: &'a dyn LocalStore,
        remote: &'a dyn RemoteStore,
        cache: &'a RemoteListingCache,
        dataset: &'a RemoteDatasetId,
    ) -> Self {
        Self {
            local,
            remote,
            cache,
            dataset,
            mode: ValidationMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Partition the ids of both sides and compare every common document.
    ///
    /// Only listing failures are returned as errors.
    pub fn run(&self) -> SyncResult<ValidationReport> {
        let (documents, _) = self.local.list_documents()?;
        let remote = self.cache.list(self.remote, self.dataset)?.dedup_logical();

        let local_set: BTreeSet<LogicalId> =
            documents.iter().map(|d| d.logical_id.clone()).collect();
        let remote_set = remote.logical_set();

        let mut report = ValidationReport {
            local_only: local_set.difference(&remote_set).cloned().collect(),
            remote_only: remote_set.difference(&local_set).cloned().collect(),
            common: local_set.intersection(&remote_set).cloned().collect(),
            ..Default::default()
        };

        let by_id: BTreeMap<&LogicalId, &Document> =
            documents.iter().map(|d| (&d.logical_id, d)).collect();
        let common: RemoteIdMap = remote.filter(|id, _| by_id.contains_key(id));
        let fetched = self.fetch(&common);

        for (logical_id, store_id) in common.iter() {
            let Some(document) = by_id.get(logical_id) else {
                continue;
            };
            let local = strip_volatile(&document.to_properties(), VOLATILE_KEYS);
            let (reason, remote_props) = match fetched.get(store_id) {
                Some(Ok(record)) => {
                    let remote_props = strip_volatile(&record.properties, VOLATILE_KEYS);
                    if remote_props == local {
                        continue;
                    }
                    (MismatchReason::PropertiesDiffer, Some(remote_props))
                }
                Some(Err(message)) => (MismatchReason::RetrievalFailed(message.clone()), None),
                None => (MismatchReason::RemoteMissing, None),
            };
            report.record(logical_id.clone(), reason, local, remote_props);
        }

        info!(
            dataset = %self.dataset,
            mode = %self.mode,
            common = report.common.len(),
            mismatched = report.mismatched.len(),
            "validation complete"
        );
        Ok(report)
    }

    /// Fetch the remote records for `common`, keyed by store id. A record
    /// absent from the map was not returned by the remote.
    fn fetch(&self, common: &RemoteIdMap) -> BTreeMap<StoreId, Result<RemoteRecord, String>> {
        let mut out = BTreeMap::new();
        if common.is_empty() {
            return out;
        }
        match self.mode {
            ValidationMode::Bulk => {
                match self
                    .remote
                    .download_document_collection(self.dataset, common.store_ids())
                {
                    Ok(records) => {
                        for record in records {
                            out.insert(record.store_id.clone(), Ok(record));
                        }
                    }
                    Err(err) => {
                        warn!(dataset = %self.dataset, error = %err, "bulk retrieval failed");
                        let message = err.to_string();
                        for store_id in common.store_ids() {
                            out.insert(store_id.clone(), Err(message.clone()));
                        }
                    }
                }
            }
            ValidationMode::Serial => {
                for store_id in common.store_ids() {
                    match self.remote.get_document(self.dataset, store_id) {
                        Ok(Some(record)) => {
                            out.insert(store_id.clone(), Ok(record));
                        }
                        Ok(None) => debug!(%store_id, "remote record missing"),
                        Err(err) => {
                            out.insert(store_id.clone(), Err(err.to_string()));
                        }
                    }
                }
            }
        }
        out
    }
}

impl ValidationReport {
    fn record(
        &mut self,
        logical_id: LogicalId,
        reason: MismatchReason,
        local: Map<String, Value>,
        remote: Option<Map<String, Value>>,
    ) {
        let (diff, rendered) = match &remote {
            Some(remote) => (diff_properties(&local, remote), render_unified(&local, remote)),
            None => (PropertyDiff::default(), String::new()),
        };
        self.mismatched.push(logical_id.clone());
        self.mismatch_details.push(Mismatch {
            logical_id: logical_id.clone(),
            reason,
            diff,
            rendered,
        });
        self.snapshots
            .insert(logical_id, SnapshotPair { local, remote });
    }
}
