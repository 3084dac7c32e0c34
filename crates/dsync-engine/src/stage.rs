use std::time::Duration;

use dsync_index::{IndexStore, SyncIndex};
use dsync_store::{LocalStore, RemoteListingCache, RemoteStore};
use dsync_types::{DatasetPair, Document, LogicalId, RemoteIdMap, TransferReport};

use crate::config::SyncOptions;
use crate::error::{SyncError, SyncResult, TransferPhase};
use crate::state::RunState;
use crate::trace::SyncTrace;

// ---------------------------------------------------------------------------
// SyncStage
// ---------------------------------------------------------------------------

/// One step of a sync pipeline.
pub trait SyncStage: Send + Sync {
    /// Short name used in stage records and logs.
    fn name(&self) -> &str;

    /// Run the stage, returning the number of documents it touched.
    fn run(&self, ctx: &mut StageContext<'_>) -> SyncResult<usize>;
}

/// Which listing of a side a stage reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Snapshot {
    /// As listed at the start of the run.
    Initial,
    /// As most recently listed.
    Current,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Local,
    Remote,
}

/// Recorded result of a completed stage.
#[derive(Clone, Debug)]
pub struct StageRecord {
    pub stage_name: String,
    pub affected: usize,
    /// Run state when the stage finished.
    pub state: RunState,
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// StageContext
// ---------------------------------------------------------------------------

/// A local listing: documents and their parallel logical ids.
#[derive(Clone, Debug, Default)]
pub struct LocalSnapshot {
    pub documents: Vec<Document>,
    pub ids: Vec<LogicalId>,
}

/// Mutable state shared by the stages of one run.
pub struct StageContext<'a> {
    pub(crate) local: &'a dyn LocalStore,
    pub(crate) remote: &'a dyn RemoteStore,
    pub(crate) index: &'a dyn IndexStore,
    pub(crate) cache: &'a RemoteListingCache,
    pub(crate) options: &'a SyncOptions,
    pub(crate) pair: DatasetPair,
    state: RunState,

    /// Index read at the start of the run (empty if none existed).
    pub(crate) baseline: SyncIndex,
    pub(crate) initial_local: Option<LocalSnapshot>,
    pub(crate) current_local: Option<LocalSnapshot>,
    pub(crate) initial_remote: Option<RemoteIdMap>,
    pub(crate) current_remote: Option<RemoteIdMap>,

    pub(crate) trace: SyncTrace,
    pub(crate) uploaded: Vec<LogicalId>,
    pub(crate) downloaded: Vec<LogicalId>,
    pub(crate) deleted_remote: Vec<LogicalId>,
    pub(crate) deleted_local: Vec<LogicalId>,
    pub(crate) reports: Vec<(TransferPhase, TransferReport)>,
    pub(crate) index_written: bool,
}

impl<'a> StageContext<'a> {
    pub fn new(
        local: &'a dyn LocalStore,
        remote: &'a dyn RemoteStore,
        index: &'a dyn IndexStore,
        cache: &'a RemoteListingCache,
        options: &'a SyncOptions,
        pair: DatasetPair,
    ) -> Self {
        Self {
            local,
            remote,
            index,
            cache,
            options,
            pair,
            state: RunState::Idle,
            baseline: SyncIndex::default(),
            initial_local: None,
            current_local: None,
            initial_remote: None,
            current_remote: None,
            trace: SyncTrace::new(options.verbose),
            uploaded: Vec::new(),
            downloaded: Vec::new(),
            deleted_remote: Vec::new(),
            deleted_local: Vec::new(),
            reports: Vec::new(),
            index_written: false,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn pair(&self) -> &DatasetPair {
        &self.pair
    }

    pub fn options(&self) -> &SyncOptions {
        self.options
    }

    pub fn baseline(&self) -> &SyncIndex {
        &self.baseline
    }

    pub fn trace(&self) -> &SyncTrace {
        &self.trace
    }

    /// Move to `next`, rejecting transitions the run lifecycle forbids.
    /// Moving to the current state is a no-op.
    pub fn advance(&mut self, next: RunState) -> SyncResult<()> {
        if self.state == next {
            return Ok(());
        }
        if !self.state.can_transition_to(next) {
            return Err(SyncError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    pub(crate) fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.state = RunState::Failed;
        }
    }

    pub(crate) fn local_snapshot(&self, which: Snapshot, stage: &str) -> SyncResult<&LocalSnapshot> {
        let snap = match which {
            Snapshot::Initial => self.initial_local.as_ref(),
            Snapshot::Current => self.current_local.as_ref(),
        };
        snap.ok_or_else(|| SyncError::stage(stage, "local side has not been listed"))
    }

    pub(crate) fn remote_snapshot(&self, which: Snapshot, stage: &str) -> SyncResult<&RemoteIdMap> {
        let snap = match which {
            Snapshot::Initial => self.initial_remote.as_ref(),
            Snapshot::Current => self.current_remote.as_ref(),
        };
        snap.ok_or_else(|| SyncError::stage(stage, "remote side has not been listed"))
    }

    pub(crate) fn list_local(&self) -> SyncResult<LocalSnapshot> {
        let (documents, ids) = self.local.list_documents()?;
        Ok(LocalSnapshot { documents, ids })
    }

    pub(crate) fn list_remote(&self) -> SyncResult<RemoteIdMap> {
        Ok(self.cache.list(self.remote, &self.pair.remote)?)
    }
}
