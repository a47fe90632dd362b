//! Usage-accounting contract.

use crate::error::ServiceError;
use async_trait::async_trait;

/// Kernel contract for recording successful interface invocations.
///
/// The gateway calls this at most once per successfully forwarded response,
/// from the streaming decorator, and treats failure as log-worthy but never
/// response-altering.  Implementations must therefore be safe to call while
/// a response is in flight.
#[async_trait]
pub trait UsageMeter: Send + Sync {
    /// Record one invocation of `interface_id` by `user_id`.
    async fn record_invocation(&self, interface_id: i64, user_id: i64) -> Result<(), ServiceError>;
}
