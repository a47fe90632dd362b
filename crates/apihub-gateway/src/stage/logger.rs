//! Inbound-request logging stage.
//!
//! Emits one structured `tracing` event per request before any check runs,
//! so even requests denied by the earliest stage leave a trace.  Response
//! logging lives in the server handler, where the final status and latency
//! are known.

use apihub_kernel::{PipelineStage, RequestContext, StageOrder, StageVerdict};
use async_trait::async_trait;
use tracing::info;

/// Logging stage — records every inbound request.
#[derive(Default)]
pub struct RequestLogStage;

impl RequestLogStage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PipelineStage for RequestLogStage {
    fn name(&self) -> &str {
        "request-log"
    }

    fn order(&self) -> StageOrder {
        StageOrder::REQUEST_LOG
    }

    async fn on_request(&self, ctx: &mut RequestContext) -> StageVerdict {
        info!(
            request_id = %ctx.request.id,
            method     = ctx.request.method.as_str(),
            path       = %ctx.request.path,
            source     = ?ctx.request.source_address(),
            "→ inbound request"
        );
        StageVerdict::Continue
    }
}
