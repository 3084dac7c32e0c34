use dsync_types::{DatasetPair, LogicalId, TransferReport};

use crate::error::TransferPhase;
use crate::policy::SyncPolicy;
use crate::stage::{StageContext, StageRecord};
use crate::state::RunState;
use crate::trace::SyncTrace;

/// Result of a completed sync run.
///
/// On a dry run the id lists hold what a live run would have transferred.
#[derive(Debug)]
pub struct SyncOutcome {
    pub policy: SyncPolicy,
    pub pair: DatasetPair,
    pub dry_run: bool,
    pub uploaded: Vec<LogicalId>,
    pub downloaded: Vec<LogicalId>,
    pub deleted_remote: Vec<LogicalId>,
    pub deleted_local: Vec<LogicalId>,
    pub reports: Vec<(TransferPhase, TransferReport)>,
    pub stages: Vec<StageRecord>,
    pub trace: SyncTrace,
    pub index_written: bool,
    pub final_state: RunState,
}

impl SyncOutcome {
    pub(crate) fn from_context(
        policy: SyncPolicy,
        ctx: StageContext<'_>,
        stages: Vec<StageRecord>,
    ) -> Self {
        let final_state = ctx.state();
        Self {
            policy,
            pair: ctx.pair,
            dry_run: ctx.options.dry_run,
            uploaded: ctx.uploaded,
            downloaded: ctx.downloaded,
            deleted_remote: ctx.deleted_remote,
            deleted_local: ctx.deleted_local,
            reports: ctx.reports,
            stages,
            trace: ctx.trace,
            index_written: ctx.index_written,
            final_state,
        }
    }

    /// Total documents transferred or removed across every phase.
    pub fn changed(&self) -> usize {
        self.uploaded.len()
            + self.downloaded.len()
            + self.deleted_remote.len()
            + self.deleted_local.len()
    }

    /// True when nothing was (or on a dry run, would be) changed.
    pub fn is_noop(&self) -> bool {
        self.changed() == 0
    }

    /// The "would ..." lines recorded on a dry run.
    pub fn would_lines(&self) -> Vec<&str> {
        self.trace.would_lines()
    }

    pub fn report(&self, phase: TransferPhase) -> Option<&TransferReport> {
        self.reports
            .iter()
            .find(|(p, _)| *p == phase)
            .map(|(_, r)| r)
    }
}
