//! Pipeline stage trait and ordering types.
//!
//! The mediation pipeline is an ordered list of [`PipelineStage`] instances
//! applied to every inbound request.  Stages are sorted by their declared
//! [`StageOrder`] and executed in ascending order; the first rejection
//! short-circuits the rest, so no later stage observes a denied request.
//!
//! ```text
//! Request ──► RequestLog ──► AccessControl ──► Authentication ──► InterfaceLookup
//!                  (upstream dispatch and response metering happen after)
//! ```

use crate::error::Denial;
use crate::types::RequestContext;
use async_trait::async_trait;

// ─────────────────────────────────────────────────────────────────────────────
// Stage ordering
// ─────────────────────────────────────────────────────────────────────────────

/// Numeric ordering slot for a stage in the pipeline.
///
/// The well-known slots below act as guidelines; any `u32` value is accepted
/// so deployments can slot custom stages between the standard phases.
/// Stages with equal order values are executed in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct StageOrder(pub u32);

impl StageOrder {
    /// Inbound request logging — runs before any check.
    pub const REQUEST_LOG: StageOrder = StageOrder(0);
    /// Source-address allow-list slot.
    pub const ACCESS_CONTROL: StageOrder = StageOrder(100);
    /// Signature authentication slot.
    pub const AUTHENTICATION: StageOrder = StageOrder(200);
    /// Interface resolution slot — runs last, after the caller is known.
    pub const INTERFACE_LOOKUP: StageOrder = StageOrder(300);
}

// ─────────────────────────────────────────────────────────────────────────────
// Stage verdict
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of running one stage against a request.
///
/// There is no error channel: every way a stage can fail is a [`Denial`],
/// including internal collaborator failures, which stages log and fold into
/// the opaque denial the caller is allowed to see.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StageVerdict {
    /// Pass the (possibly annotated) request to the next stage.
    Continue,
    /// Short-circuit the pipeline and answer the caller with this denial.
    Reject(Denial),
}

// ─────────────────────────────────────────────────────────────────────────────
// PipelineStage trait
// ─────────────────────────────────────────────────────────────────────────────

/// Kernel contract for a single stage in the mediation pipeline.
///
/// Implementations must be `Send + Sync` so they can be shared across Tokio
/// tasks without additional synchronization by the caller.
#[async_trait]
pub trait PipelineStage: Send + Sync {
    /// Stable, human-readable identifier for this stage (used in logs).
    fn name(&self) -> &str;

    /// Position in the pipeline.  Lower values execute first.
    fn order(&self) -> StageOrder;

    /// Inspect the request and decide whether mediation continues.
    ///
    /// Implementations may mutate `ctx` (attach the auth context, advance the
    /// lifecycle phase, …).  A stage that rejects is responsible for setting
    /// the matching terminal phase on `ctx` before returning.
    async fn on_request(&self, ctx: &mut RequestContext) -> StageVerdict;
}
