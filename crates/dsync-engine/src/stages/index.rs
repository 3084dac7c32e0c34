use dsync_index::SyncIndex;

use crate::error::SyncResult;
use crate::stage::{Snapshot, StageContext, SyncStage};
use crate::state::RunState;

/// What a successful run records in the sync index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexUpdate {
    /// Replace only the local marker with the listed local ids.
    LocalMarker,
    /// Replace only the remote marker with the listed remote ids.
    RemoteMarker,
    /// List both sides again and record both.
    Full,
}

/// Persist the sync index. Must be the last stage; on a dry run it only
/// traces what it would write.
pub struct WriteIndexStage(pub IndexUpdate);

impl SyncStage for WriteIndexStage {
    fn name(&self) -> &str {
        "write-index"
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> SyncResult<usize> {
        if ctx.options.dry_run {
            ctx.trace
                .would(format!("write sync index for {}", ctx.pair));
            return Ok(0);
        }
        ctx.advance(RunState::Indexing)?;

        let index = match self.0 {
            IndexUpdate::LocalMarker => {
                let local = ctx.local_snapshot(Snapshot::Current, self.name())?;
                ctx.baseline.with_local(local.ids.iter().cloned())
            }
            IndexUpdate::RemoteMarker => {
                let remote = ctx.remote_snapshot(Snapshot::Current, self.name())?;
                ctx.baseline
                    .with_remote(remote.logical_ids().iter().cloned())
            }
            IndexUpdate::Full => {
                let local = ctx.list_local()?;
                let remote = ctx.list_remote()?;
                SyncIndex::new(local.ids, remote.logical_ids().iter().cloned())
            }
        };

        ctx.index.write(&ctx.pair, &index)?;
        ctx.index_written = true;
        ctx.trace.progress(format!(
            "wrote sync index ({} local, {} remote ids)",
            index.local_document_ids_last_sync.len(),
            index.remote_document_ids_last_sync.len()
        ));
        Ok(index.local_document_ids_last_sync.len() + index.remote_document_ids_last_sync.len())
    }
}
