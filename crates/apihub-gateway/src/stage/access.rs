//! Source-address allow-list stage.
//!
//! The allow-list is immutable configuration injected at construction; there
//! is no runtime mutation path.  Requests whose source address cannot be
//! resolved at all are denied, not waved through.

use apihub_kernel::{
    Denial, PipelineStage, RequestContext, RequestPhase, StageOrder, StageVerdict,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::net::IpAddr;
use tracing::warn;

/// Access-control stage that admits only allow-listed source addresses.
pub struct AccessControlStage {
    allow_list: HashSet<IpAddr>,
}

impl AccessControlStage {
    /// Build the stage from the configured allow-list.
    pub fn new(allow_list: impl IntoIterator<Item = IpAddr>) -> Self {
        Self {
            allow_list: allow_list.into_iter().collect(),
        }
    }
}

#[async_trait]
impl PipelineStage for AccessControlStage {
    fn name(&self) -> &str {
        "ip-allow-list"
    }

    fn order(&self) -> StageOrder {
        StageOrder::ACCESS_CONTROL
    }

    async fn on_request(&self, ctx: &mut RequestContext) -> StageVerdict {
        match ctx.request.source_address() {
            Some(ip) if self.allow_list.contains(&ip) => {
                ctx.phase = RequestPhase::IpChecked;
                StageVerdict::Continue
            }
            Some(ip) => {
                warn!(
                    request_id = %ctx.request.id,
                    source = %ip,
                    "rejected request: address not on allow-list"
                );
                ctx.phase = RequestPhase::DeniedIp;
                StageVerdict::Reject(Denial::Authorization)
            }
            None => {
                warn!(
                    request_id = %ctx.request.id,
                    "rejected request: source address could not be resolved"
                );
                ctx.phase = RequestPhase::DeniedIp;
                StageVerdict::Reject(Denial::Authorization)
            }
        }
    }
}
