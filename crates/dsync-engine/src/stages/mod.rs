//! Built-in sync stages.
//!
//! Each policy is an ordered composition of these (see `policy.rs`).

pub mod delete;
pub mod download;
pub mod index;
pub mod list;
pub mod upload;

pub use delete::DeleteStage;
pub use download::DownloadStage;
pub use index::{IndexUpdate, WriteIndexStage};
pub use list::{ListStage, ReListStage};
pub use upload::UploadStage;

use crate::stage::Snapshot;

/// Where a transfer stage takes its candidate ids from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeltaSource {
    /// Set difference of the chosen local and remote listings.
    Diff { local: Snapshot, remote: Snapshot },
    /// Ids listed now but absent from the sync index baseline.
    SinceIndex,
}

impl DeltaSource {
    /// Diff of the two current listings.
    pub const CURRENT: DeltaSource = DeltaSource::Diff {
        local: Snapshot::Current,
        remote: Snapshot::Current,
    };
}
