use dsync_diff::{diff_ids, remote_extras};
use dsync_types::{ChunkStatus, LogicalId, RemoteIdMap};

use super::list::side_name;
use crate::error::{SyncResult, TransferPhase};
use crate::stage::{Side, Snapshot, StageContext, SyncStage};
use crate::state::RunState;
use crate::transfer::BatchTransfer;

/// Delete, on one side, every document the other side lacks.
///
/// Reads the current listings of both sides, so in a mirror it must follow
/// the re-list of the side being trimmed.
pub struct DeleteStage(pub Side);

enum Doomed {
    Remote(RemoteIdMap),
    Local(Vec<LogicalId>),
}

impl SyncStage for DeleteStage {
    fn name(&self) -> &str {
        match self.0 {
            Side::Local => "delete-local",
            Side::Remote => "delete-remote",
        }
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> SyncResult<usize> {
        ctx.advance(RunState::Reconciling)?;

        let doomed = {
            let local = ctx.local_snapshot(Snapshot::Current, self.name())?;
            let remote = ctx.remote_snapshot(Snapshot::Current, self.name())?;
            match self.0 {
                // Every record whose logical id is gone locally, duplicates included.
                Side::Remote => Doomed::Remote(remote_extras(remote, &local.ids)),
                Side::Local => Doomed::Local(diff_ids(&local.ids, remote).upload),
            }
        };
        let count = match &doomed {
            Doomed::Remote(pairs) => pairs.len(),
            Doomed::Local(ids) => ids.len(),
        };
        ctx.trace.progress(format!(
            "delete: {count} {} documents to remove",
            side_name(self.0)
        ));

        ctx.advance(RunState::Transferring)?;
        let transfer = BatchTransfer::new(
            ctx.local,
            ctx.remote,
            &ctx.pair.remote,
            ctx.cache,
            ctx.options,
        );
        let (phase, report) = match &doomed {
            Doomed::Remote(pairs) => (
                TransferPhase::DeleteRemote,
                transfer.delete_remote(pairs, &mut ctx.trace)?,
            ),
            Doomed::Local(ids) => (
                TransferPhase::DeleteLocal,
                transfer.delete_local(ids, &mut ctx.trace)?,
            ),
        };

        let mut removed = report.succeeded();
        removed.extend(report.ids_with(ChunkStatus::DryRun));
        match self.0 {
            Side::Remote => ctx.deleted_remote.extend(removed),
            Side::Local => ctx.deleted_local.extend(removed),
        }
        ctx.reports.push((phase, report));
        Ok(count)
    }
}
