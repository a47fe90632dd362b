//! Upstream forwarding.
//!
//! Runs after the stage pipeline has admitted a request.  Dispatches through
//! the configured [`Upstream`], advances the lifecycle phase, and hands
//! successful (200) responses to the metering decorator.  Upstream *statuses*
//! are relayed as-is; only transport-level failures become denials.

use crate::meter;
use apihub_kernel::{Denial, RequestContext, RequestPhase, ResponseEnvelope, Upstream, UsageMeter};
use std::sync::Arc;
use tracing::{error, warn};

/// Dispatches admitted requests and decorates successful responses with
/// usage metering.
pub struct Forwarder {
    upstream: Arc<dyn Upstream>,
    meter: Arc<dyn UsageMeter>,
}

impl Forwarder {
    /// Build a forwarder around an upstream transport and a usage meter.
    pub fn new(upstream: Arc<dyn Upstream>, meter: Arc<dyn UsageMeter>) -> Self {
        Self { upstream, meter }
    }

    /// Forward the mediated request and return the response to relay.
    ///
    /// The auth context is *consumed* on the 200 path: metering takes
    /// ownership of it, so a request cannot be accounted twice.
    pub async fn forward(&self, ctx: &mut RequestContext) -> Result<ResponseEnvelope, Denial> {
        let envelope = match self.upstream.dispatch(&ctx.request).await {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(
                    request_id = %ctx.request.id,
                    error = %e,
                    "upstream dispatch failed"
                );
                ctx.phase = RequestPhase::UpstreamError;
                return Err(Denial::Upstream(e.to_string()));
            }
        };
        ctx.phase = RequestPhase::Forwarded;

        // Error statuses pass through untouched and are never metered.
        if envelope.status != 200 {
            return Ok(envelope);
        }

        let Some(auth) = ctx.take_auth() else {
            warn!(
                request_id = %ctx.request.id,
                "200 response with no auth context; relaying unmetered"
            );
            return Ok(envelope);
        };

        Ok(meter::decorate(
            envelope,
            auth,
            self.meter.clone(),
            &ctx.request.id,
        ))
    }
}
