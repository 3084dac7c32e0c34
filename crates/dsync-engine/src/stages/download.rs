use dsync_diff::{diff_ids, remote_missing_from};
use dsync_types::ChunkStatus;

use super::DeltaSource;
use crate::error::{SyncResult, TransferPhase};
use crate::stage::{Snapshot, StageContext, SyncStage};
use crate::state::RunState;
use crate::transfer::BatchTransfer;

/// Fetch remote documents the local side lacks and insert them locally.
pub struct DownloadStage(pub DeltaSource);

impl SyncStage for DownloadStage {
    fn name(&self) -> &str {
        "download"
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> SyncResult<usize> {
        ctx.advance(RunState::Reconciling)?;

        let pairs = match self.0 {
            DeltaSource::Diff { local, remote } => {
                let local = ctx.local_snapshot(local, self.name())?;
                let remote = ctx.remote_snapshot(remote, self.name())?;
                diff_ids(&local.ids, remote).download
            }
            DeltaSource::SinceIndex => {
                let remote = ctx.remote_snapshot(Snapshot::Current, self.name())?;
                remote_missing_from(remote, &ctx.baseline.remote_document_ids_last_sync)
            }
        };
        ctx.trace
            .progress(format!("download: {} documents to fetch", pairs.len()));

        ctx.advance(RunState::Transferring)?;
        let transfer = BatchTransfer::new(
            ctx.local,
            ctx.remote,
            &ctx.pair.remote,
            ctx.cache,
            ctx.options,
        );
        let local = ctx.local;
        let report = transfer.download(&pairs, &mut ctx.trace, |item| {
            local.add(&item.document)?;
            for (name, bytes) in &item.files {
                local.write_file(&item.document.logical_id, name, bytes)?;
            }
            Ok(())
        })?;

        ctx.downloaded.extend(report.succeeded());
        ctx.downloaded.extend(report.ids_with(ChunkStatus::DryRun));
        ctx.reports.push((TransferPhase::Download, report));
        Ok(pairs.len())
    }
}
