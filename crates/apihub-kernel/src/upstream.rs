//! Upstream dispatch contract.

use crate::envelope::ResponseEnvelope;
use crate::types::InboundRequest;
use async_trait::async_trait;
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// UpstreamError
// ─────────────────────────────────────────────────────────────────────────────

/// Transport-level failure while dispatching to, or streaming from, the
/// upstream service.
///
/// Variants carry strings rather than client-library error types so the
/// kernel stays free of any particular HTTP stack.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum UpstreamError {
    /// The upstream could not be reached at all.
    #[error("failed to reach upstream: {0}")]
    Connect(String),
    /// The connection was established but the body stream failed mid-flight.
    #[error("upstream response stream failed: {0}")]
    Stream(String),
    /// The upstream did not answer within the configured timeout.
    #[error("upstream did not answer within {0} ms")]
    Timeout(u64),
}

// ─────────────────────────────────────────────────────────────────────────────
// Upstream trait
// ─────────────────────────────────────────────────────────────────────────────

/// Kernel contract for the component that forwards mediated requests.
///
/// Any HTTP status from the upstream — success or error — is a *successful*
/// dispatch and comes back as an envelope; only transport failures are `Err`.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Dispatch `request` to the upstream service and hand back its response.
    async fn dispatch(&self, request: &InboundRequest) -> Result<ResponseEnvelope, UpstreamError>;
}
