//! The five reconciliation policies, each a fixed stage pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::pipeline::SyncPipeline;
use crate::stage::{Side, Snapshot};
use crate::stages::{
    DeleteStage, DeltaSource, DownloadStage, IndexUpdate, ListStage, ReListStage, UploadStage,
    WriteIndexStage,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncPolicy {
    /// Download remote documents added since the last sync. Never deletes.
    DownloadNew,
    /// Upload local documents added since the last sync. Never deletes.
    UploadNew,
    /// Make the remote an exact copy of the local dataset.
    MirrorToRemote,
    /// Make the local dataset an exact copy of the remote.
    MirrorFromRemote,
    /// Copy what is missing in both directions. Never deletes.
    TwoWay,
}

impl SyncPolicy {
    pub const ALL: [SyncPolicy; 5] = [
        SyncPolicy::DownloadNew,
        SyncPolicy::UploadNew,
        SyncPolicy::MirrorToRemote,
        SyncPolicy::MirrorFromRemote,
        SyncPolicy::TwoWay,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SyncPolicy::DownloadNew => "download-new",
            SyncPolicy::UploadNew => "upload-new",
            SyncPolicy::MirrorToRemote => "mirror-to-remote",
            SyncPolicy::MirrorFromRemote => "mirror-from-remote",
            SyncPolicy::TwoWay => "two-way",
        }
    }

    /// Whether the policy can remove documents from either side.
    pub fn deletes(self) -> bool {
        matches!(self, SyncPolicy::MirrorToRemote | SyncPolicy::MirrorFromRemote)
    }

    /// Build the stage pipeline for this policy.
    ///
    /// Mirrors re-list the mutated side before computing deletions, so a
    /// document uploaded in the same run is never taken for an extra.
    /// Two-way diffs each direction against the other side's listing from
    /// the start of the run.
    pub fn pipeline(self) -> SyncPipeline {
        let pipeline = SyncPipeline::new().then(ListStage);
        match self {
            SyncPolicy::DownloadNew => pipeline
                .then(DownloadStage(DeltaSource::SinceIndex))
                .then(WriteIndexStage(IndexUpdate::RemoteMarker)),
            SyncPolicy::UploadNew => pipeline
                .then(UploadStage(DeltaSource::SinceIndex))
                .then(WriteIndexStage(IndexUpdate::LocalMarker)),
            SyncPolicy::MirrorToRemote => pipeline
                .then(UploadStage(DeltaSource::CURRENT))
                .then(ReListStage(Side::Remote))
                .then(DeleteStage(Side::Remote))
                .then(WriteIndexStage(IndexUpdate::Full)),
            SyncPolicy::MirrorFromRemote => pipeline
                .then(DownloadStage(DeltaSource::CURRENT))
                .then(ReListStage(Side::Local))
                .then(DeleteStage(Side::Local))
                .then(WriteIndexStage(IndexUpdate::Full)),
            SyncPolicy::TwoWay => pipeline
                .then(UploadStage(DeltaSource::Diff {
                    local: Snapshot::Current,
                    remote: Snapshot::Initial,
                }))
                .then(ReListStage(Side::Remote))
                .then(DownloadStage(DeltaSource::Diff {
                    local: Snapshot::Initial,
                    remote: Snapshot::Current,
                }))
                .then(WriteIndexStage(IndexUpdate::Full)),
        }
    }
}

impl fmt::Display for SyncPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SyncPolicy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SyncPolicy::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = SyncPolicy::ALL.iter().map(|p| p.name()).collect();
                SyncError::config(
                    "policy",
                    format!("unknown policy `{s}`, expected one of {}", known.join(", ")),
                )
            })
    }
}
