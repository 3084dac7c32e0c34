use dsync_diff::{diff_ids, missing_from, select_documents};
use dsync_types::ChunkStatus;

use super::DeltaSource;
use crate::error::{SyncResult, TransferPhase};
use crate::stage::{Snapshot, StageContext, SyncStage};
use crate::state::RunState;
use crate::transfer::BatchTransfer;

/// Upload local documents the remote lacks.
pub struct UploadStage(pub DeltaSource);

impl SyncStage for UploadStage {
    fn name(&self) -> &str {
        "upload"
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> SyncResult<usize> {
        ctx.advance(RunState::Reconciling)?;

        let documents = match self.0 {
            DeltaSource::Diff { local, remote } => {
                let local = ctx.local_snapshot(local, self.name())?;
                let remote = ctx.remote_snapshot(remote, self.name())?;
                let ids = diff_ids(&local.ids, remote).upload;
                select_documents(&local.documents, &ids)
            }
            DeltaSource::SinceIndex => {
                let local = ctx.local_snapshot(Snapshot::Current, self.name())?;
                let ids = missing_from(&local.ids, &ctx.baseline.local_document_ids_last_sync);
                select_documents(&local.documents, &ids)
            }
        };
        ctx.trace
            .progress(format!("upload: {} documents to send", documents.len()));

        ctx.advance(RunState::Transferring)?;
        let transfer = BatchTransfer::new(
            ctx.local,
            ctx.remote,
            &ctx.pair.remote,
            ctx.cache,
            ctx.options,
        );
        let report = transfer.upload(&documents, &mut ctx.trace)?;

        ctx.uploaded.extend(report.succeeded());
        ctx.uploaded.extend(report.ids_with(ChunkStatus::DryRun));
        ctx.reports.push((TransferPhase::Upload, report));
        Ok(documents.len())
    }
}
