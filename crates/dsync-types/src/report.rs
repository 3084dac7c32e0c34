//! Transfer reports.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::LogicalId;

/// How a transfer moved documents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadType {
    /// Nothing was transferred.
    #[default]
    None,
    /// One document per call.
    Serial,
    /// Compressed chunks of documents.
    Batch,
}

/// Outcome tag for one manifest entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStatus {
    Success,
    Failure,
    /// Not attempted because an earlier chunk failed.
    NotAttempted,
    /// Suppressed by dry-run mode.
    DryRun,
}

impl fmt::Display for ChunkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::NotAttempted => "not_attempted",
            Self::DryRun => "dry_run",
        };
        f.write_str(s)
    }
}

/// Per-chunk record of a transfer.
///
/// `manifest[i]` lists the ids carried by chunk `i` and `status[i]` is its
/// outcome; the two sequences always have equal length.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReport {
    pub upload_type: UploadType,
    manifest: Vec<Vec<LogicalId>>,
    status: Vec<ChunkStatus>,
}

impl TransferReport {
    pub fn new(upload_type: UploadType) -> Self {
        Self {
            upload_type,
            manifest: Vec::new(),
            status: Vec::new(),
        }
    }

    /// Record the outcome of one chunk.
    pub fn record(&mut self, ids: Vec<LogicalId>, status: ChunkStatus) {
        self.manifest.push(ids);
        self.status.push(status);
    }

    pub fn manifest(&self) -> &[Vec<LogicalId>] {
        &self.manifest
    }

    pub fn status(&self) -> &[ChunkStatus] {
        &self.status
    }

    pub fn chunk_count(&self) -> usize {
        self.manifest.len()
    }

    /// Iterate over `(ids, status)` per chunk.
    pub fn chunks(&self) -> impl Iterator<Item = (&[LogicalId], ChunkStatus)> {
        self.manifest
            .iter()
            .map(Vec::as_slice)
            .zip(self.status.iter().copied())
    }

    /// Returns `true` if no chunk failed or was skipped because of a failure.
    pub fn is_success(&self) -> bool {
        self.status
            .iter()
            .all(|s| matches!(s, ChunkStatus::Success | ChunkStatus::DryRun))
    }

    /// Ids of every chunk with the given status, in manifest order.
    pub fn ids_with(&self, status: ChunkStatus) -> Vec<LogicalId> {
        self.chunks()
            .filter(|(_, s)| *s == status)
            .flat_map(|(ids, _)| ids.iter().cloned())
            .collect()
    }

    pub fn succeeded(&self) -> Vec<LogicalId> {
        self.ids_with(ChunkStatus::Success)
    }

    pub fn failed(&self) -> Vec<LogicalId> {
        self.ids_with(ChunkStatus::Failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> Vec<LogicalId> {
        v.iter().map(|s| LogicalId::from(*s)).collect()
    }

    #[test]
    fn default_report_is_empty_success() {
        let r = TransferReport::default();
        assert_eq!(r.upload_type, UploadType::None);
        assert_eq!(r.chunk_count(), 0);
        assert!(r.is_success());
    }

    #[test]
    fn failure_and_not_attempted_break_success() {
        let mut r = TransferReport::new(UploadType::Batch);
        r.record(ids(&["a", "b"]), ChunkStatus::Success);
        r.record(ids(&["c"]), ChunkStatus::Failure);
        r.record(ids(&["d"]), ChunkStatus::NotAttempted);

        assert!(!r.is_success());
        assert_eq!(r.succeeded(), ids(&["a", "b"]));
        assert_eq!(r.failed(), ids(&["c"]));
        assert_eq!(r.ids_with(ChunkStatus::NotAttempted), ids(&["d"]));
        assert_eq!(r.manifest().len(), r.status().len());
    }

    #[test]
    fn status_serializes_as_tags() {
        let json = serde_json::to_string(&ChunkStatus::NotAttempted).unwrap();
        assert_eq!(json, "\"not_attempted\"");
        assert_eq!(ChunkStatus::Failure.to_string(), "failure");
        let json = serde_json::to_string(&UploadType::Serial).unwrap();
        assert_eq!(json, "\"serial\"");
    }
}
