use std::time::Instant;

use tracing::{debug, warn};

use crate::error::SyncResult;
use crate::stage::{StageContext, StageRecord, SyncStage};
use crate::state::RunState;

/// An ordered list of stages run strictly in sequence.
///
/// The order is the contract: a stage may only depend on the effects of
/// stages before it (a mirror's delete stage reads the listing taken after
/// its upload stage).
#[derive(Default)]
pub struct SyncPipeline {
    stages: Vec<Box<dyn SyncStage>>,
}

impl SyncPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    pub fn add_stage(&mut self, stage: Box<dyn SyncStage>) {
        self.stages.push(stage);
    }

    /// Builder form of [`add_stage`](Self::add_stage).
    pub fn then(mut self, stage: impl SyncStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage. The first error moves the run to `Failed` and is
    /// returned; later stages do not run.
    pub fn run(&self, ctx: &mut StageContext<'_>) -> SyncResult<Vec<StageRecord>> {
        let mut records = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let start = Instant::now();
            match stage.run(ctx) {
                Ok(affected) => {
                    debug!(stage = stage.name(), affected, state = %ctx.state(), "stage complete");
                    records.push(StageRecord {
                        stage_name: stage.name().to_string(),
                        affected,
                        state: ctx.state(),
                        elapsed: start.elapsed(),
                    });
                }
                Err(err) => {
                    warn!(stage = stage.name(), state = %ctx.state(), error = %err, "stage failed");
                    ctx.fail();
                    return Err(err);
                }
            }
        }

        ctx.advance(RunState::Done)?;
        Ok(records)
    }
}
