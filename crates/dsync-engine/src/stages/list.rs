use crate::error::SyncResult;
use crate::stage::{Side, StageContext, SyncStage};
use crate::state::RunState;

/// Read the sync index baseline and list both sides.
///
/// The remote listing is always fetched fresh: any cached listing for the
/// dataset is dropped first.
pub struct ListStage;

impl SyncStage for ListStage {
    fn name(&self) -> &str {
        "list"
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> SyncResult<usize> {
        ctx.advance(RunState::Listing)?;

        ctx.baseline = ctx.index.read_or_default(&ctx.pair)?;
        ctx.cache.invalidate(&ctx.pair.remote);
        let local = ctx.list_local()?;
        let remote = ctx.list_remote()?;

        ctx.trace.progress(format!(
            "listed {} local and {} remote documents",
            local.ids.len(),
            remote.len()
        ));
        let listed = local.ids.len() + remote.len();
        ctx.initial_local = Some(local.clone());
        ctx.current_local = Some(local);
        ctx.initial_remote = Some(remote.clone());
        ctx.current_remote = Some(remote);
        Ok(listed)
    }
}

/// List one side again after a mutation.
pub struct ReListStage(pub Side);

impl SyncStage for ReListStage {
    fn name(&self) -> &str {
        match self.0 {
            Side::Local => "re-list-local",
            Side::Remote => "re-list-remote",
        }
    }

    fn run(&self, ctx: &mut StageContext<'_>) -> SyncResult<usize> {
        ctx.advance(RunState::ReListing)?;
        let count = match self.0 {
            Side::Local => {
                let local = ctx.list_local()?;
                let count = local.ids.len();
                ctx.current_local = Some(local);
                count
            }
            Side::Remote => {
                let remote = ctx.list_remote()?;
                let count = remote.len();
                ctx.current_remote = Some(remote);
                count
            }
        };
        ctx.trace
            .progress(format!("re-listed {count} {} documents", side_name(self.0)));
        Ok(count)
    }
}

pub(crate) fn side_name(side: Side) -> &'static str {
    match side {
        Side::Local => "local",
        Side::Remote => "remote",
    }
}
