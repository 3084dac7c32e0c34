use std::fmt;

use dsync_types::{DatasetId, LogicalId, RemoteDatasetId, TransferReport, TypeError};

use crate::state::RunState;

/// Why a dataset's remote counterpart could not be determined.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkageError {
    /// No linkage record names a remote dataset.
    #[error("dataset {0} is not linked to a remote dataset")]
    NotLinked(DatasetId),

    /// More than one distinct remote dataset is named.
    #[error("dataset {dataset} has {count} conflicting linkage records")]
    Ambiguous { dataset: DatasetId, count: usize },

    /// A link was requested for a dataset that already has a different one.
    #[error("dataset {dataset} is already linked to {remote}")]
    AlreadyLinked {
        dataset: DatasetId,
        remote: RemoteDatasetId,
    },
}

/// The transfer phase a chunk belonged to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransferPhase {
    Upload,
    Download,
    DeleteRemote,
    DeleteLocal,
}

impl fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Upload => "upload",
            Self::Download => "download",
            Self::DeleteRemote => "delete-remote",
            Self::DeleteLocal => "delete-local",
        };
        f.write_str(s)
    }
}

/// Errors that can occur while synchronizing.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// An option value is invalid. Raised before any I/O.
    #[error("invalid option '{key}': {reason}")]
    Configuration { key: String, reason: String },

    /// The remote counterpart could not be resolved. Raised before any
    /// remote I/O.
    #[error(transparent)]
    Linkage(#[from] LinkageError),

    /// A chunk failed. Later chunks of the same phase were not attempted;
    /// earlier ones stay applied. `report` holds the per-chunk outcome.
    #[error("{phase} failed at chunk {chunk} ({} documents): {reason}", .ids.len())]
    Transfer {
        phase: TransferPhase,
        chunk: usize,
        ids: Vec<LogicalId>,
        reason: String,
        report: TransferReport,
    },

    /// A stage could not run, typically because an earlier stage it
    /// depends on is missing from the pipeline.
    #[error("stage error in '{stage}': {message}")]
    Stage { stage: String, message: String },

    /// A pipeline stage attempted an illegal state change.
    #[error("invalid run state transition: {from} -> {to}")]
    InvalidTransition { from: RunState, to: RunState },

    /// A store call failed.
    #[error(transparent)]
    Store(#[from] dsync_store::StoreError),

    /// The sync index could not be read or written.
    #[error(transparent)]
    Index(#[from] dsync_index::IndexError),

    /// A chunk archive could not be built.
    #[error(transparent)]
    Pack(#[from] dsync_pack::PackError),

    /// A record did not satisfy the document model.
    #[error(transparent)]
    Type(#[from] TypeError),
}

impl SyncError {
    pub fn config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// The transfer report of a failed phase, if this is a transfer error.
    pub fn report(&self) -> Option<&TransferReport> {
        match self {
            Self::Transfer { report, .. } => Some(report),
            _ => None,
        }
    }

    pub fn is_transfer(&self) -> bool {
        matches!(self, Self::Transfer { .. })
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
