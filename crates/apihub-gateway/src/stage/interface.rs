//! Interface resolution stage.
//!
//! Reconstructs the full upstream URL for the request (configured base plus
//! inbound path) and asks the registry whether a published, enabled interface
//! is registered under that URL and method.  On a match, the descriptor is
//! attached to the auth context so the metering decorator later knows which
//! interface to account the invocation against.
//!
//! Disabled and unregistered interfaces produce the same opaque denial; the
//! distinction lives only in the logs.

use apihub_kernel::{
    Denial, InterfaceRegistry, PipelineStage, RequestContext, RequestPhase, StageOrder,
    StageVerdict,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, warn};

/// Lookup stage that resolves requests against the interface registry.
pub struct InterfaceLookupStage {
    registry: Arc<dyn InterfaceRegistry>,
    upstream_base: String,
}

impl InterfaceLookupStage {
    /// Build the stage around a registry and the upstream base URL.
    pub fn new(registry: Arc<dyn InterfaceRegistry>, upstream_base: impl Into<String>) -> Self {
        Self {
            registry,
            // Normalized without a trailing slash so base + path never
            // doubles the separator.
            upstream_base: upstream_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Full upstream URL the request would be forwarded to.
    fn resolve_url(&self, path: &str) -> String {
        format!("{}{}", self.upstream_base, path)
    }

    fn deny(ctx: &mut RequestContext) -> StageVerdict {
        ctx.phase = RequestPhase::DeniedInterface;
        StageVerdict::Reject(Denial::Routing)
    }
}

#[async_trait]
impl PipelineStage for InterfaceLookupStage {
    fn name(&self) -> &str {
        "interface-lookup"
    }

    fn order(&self) -> StageOrder {
        StageOrder::INTERFACE_LOOKUP
    }

    async fn on_request(&self, ctx: &mut RequestContext) -> StageVerdict {
        let url = self.resolve_url(&ctx.request.path);

        let descriptor = match self.registry.find(&url, &ctx.request.method).await {
            Ok(Some(descriptor)) => descriptor,
            Ok(None) => {
                warn!(
                    request_id = %ctx.request.id,
                    url = %url,
                    method = ctx.request.method.as_str(),
                    "rejected request: no interface registered"
                );
                return Self::deny(ctx);
            }
            Err(e) => {
                error!(
                    request_id = %ctx.request.id,
                    url = %url,
                    error = %e,
                    "interface lookup failed"
                );
                return Self::deny(ctx);
            }
        };

        if !descriptor.enabled {
            warn!(
                request_id = %ctx.request.id,
                interface_id = descriptor.id,
                "rejected request: interface is disabled"
            );
            return Self::deny(ctx);
        }

        if let Some(auth) = ctx.auth.as_mut() {
            auth.interface = Some(descriptor);
            ctx.phase = RequestPhase::InterfaceResolved;
            return StageVerdict::Continue;
        }

        // Pipeline ordering guarantees the auth stage ran first; reaching
        // this point without a caller means the pipeline was misassembled.
        error!(
            request_id = %ctx.request.id,
            "interface stage ran without an authenticated caller"
        );
        Self::deny(ctx)
    }
}
