//! Mediation stage module.

mod access;
mod auth;
mod interface;
mod logger;

pub use access::AccessControlStage;
pub use auth::AuthenticationStage;
pub use interface::InterfaceLookupStage;
pub use logger::RequestLogStage;

use apihub_kernel::{PipelineStage, RequestContext, StageVerdict};
use std::sync::Arc;
use tracing::debug;

/// Ordered list of boxed stages executed as a pipeline.
///
/// Stages are sorted by [`StageOrder`](apihub_kernel::StageOrder) in
/// ascending order (lowest value runs first).
pub struct StagePipeline {
    stages: Vec<Arc<dyn PipelineStage>>,
}

impl StagePipeline {
    /// Build a pipeline from a list of stages, sorted by their declared order.
    pub fn new(mut stages: Vec<Arc<dyn PipelineStage>>) -> Self {
        stages.sort_by_key(|s| s.order());
        Self { stages }
    }

    /// Run every stage's `on_request` hook in ascending order.
    ///
    /// Returns [`StageVerdict::Continue`] if all stages pass.  Short-circuits
    /// on the first rejection, so no later stage observes a denied request.
    pub async fn run(&self, ctx: &mut RequestContext) -> StageVerdict {
        for stage in &self.stages {
            debug!(request_id = %ctx.request.id, stage = stage.name(), "running stage");
            match stage.on_request(ctx).await {
                StageVerdict::Continue => {}
                verdict => return verdict,
            }
        }
        StageVerdict::Continue
    }
}
