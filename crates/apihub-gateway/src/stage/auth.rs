//! Signature authentication stage.
//!
//! Verifies the four-header signing contract before any platform lookup:
//!
//! 1. `accesskey`, `nonce`, `timestamp`, and `sign` headers present and
//!    non-empty,
//! 2. nonce parses as `u64` and does not exceed the configured ceiling,
//! 3. timestamp parses as `i64` Unix seconds and lies within the replay
//!    window of the gateway clock,
//! 4. the access key resolves to a registered credential,
//! 5. the supplied signature matches the canonical recomputation.
//!
//! Checks run cheapest-first, so malformed requests never reach the user
//! directory.  The nonce ceiling and replay window bound the replay surface
//! but do not eliminate it: without a store of recently seen nonces, a signed
//! request can be replayed verbatim inside the window.  Closing that gap
//! requires a shared nonce cache.
//!
//! Key material never appears in log output; rejections log only which check
//! failed.

use apihub_kernel::{
    verify_signature, AuthContext, Denial, PipelineStage, RequestContext, RequestPhase,
    StageOrder, StageVerdict, UserDirectory, HEADER_ACCESS_KEY, HEADER_NONCE, HEADER_SIGN,
    HEADER_TIMESTAMP,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, warn};

/// Authentication stage that enforces the canonical signing contract.
pub struct AuthenticationStage {
    directory: Arc<dyn UserDirectory>,
    nonce_ceiling: u64,
    replay_window_secs: u64,
}

impl AuthenticationStage {
    /// Build the stage around a user directory and the configured bounds.
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        nonce_ceiling: u64,
        replay_window_secs: u64,
    ) -> Self {
        Self {
            directory,
            nonce_ceiling,
            replay_window_secs,
        }
    }

    /// Fetch a required header, trimmed.  Absent or blank headers are a
    /// validation failure that names the header (the header contract is
    /// public; the values are not logged).
    fn required_header(ctx: &RequestContext, name: &'static str) -> Result<String, Denial> {
        match ctx.request.header(name).map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            _ => {
                warn!(
                    request_id = %ctx.request.id,
                    header = name,
                    "rejected request: required auth header missing or empty"
                );
                Err(Denial::Validation(format!(
                    "missing required header '{name}'"
                )))
            }
        }
    }

    /// Mark the request denied-by-auth and wrap the denial in a verdict.
    fn deny(ctx: &mut RequestContext, denial: Denial) -> StageVerdict {
        ctx.phase = RequestPhase::DeniedAuth;
        StageVerdict::Reject(denial)
    }
}

#[async_trait]
impl PipelineStage for AuthenticationStage {
    fn name(&self) -> &str {
        "signature-auth"
    }

    fn order(&self) -> StageOrder {
        StageOrder::AUTHENTICATION
    }

    async fn on_request(&self, ctx: &mut RequestContext) -> StageVerdict {
        // ── 1. header presence ──
        let access_key = match Self::required_header(ctx, HEADER_ACCESS_KEY) {
            Ok(v) => v,
            Err(d) => return Self::deny(ctx, d),
        };
        let nonce_raw = match Self::required_header(ctx, HEADER_NONCE) {
            Ok(v) => v,
            Err(d) => return Self::deny(ctx, d),
        };
        let timestamp_raw = match Self::required_header(ctx, HEADER_TIMESTAMP) {
            Ok(v) => v,
            Err(d) => return Self::deny(ctx, d),
        };
        let sign = match Self::required_header(ctx, HEADER_SIGN) {
            Ok(v) => v,
            Err(d) => return Self::deny(ctx, d),
        };

        // ── 2. nonce bounds ──
        let Ok(nonce) = nonce_raw.parse::<u64>() else {
            warn!(request_id = %ctx.request.id, "rejected request: nonce is not an integer");
            return Self::deny(
                ctx,
                Denial::Validation("nonce must be a non-negative integer".into()),
            );
        };
        if nonce > self.nonce_ceiling {
            warn!(
                request_id = %ctx.request.id,
                nonce,
                ceiling = self.nonce_ceiling,
                "rejected request: nonce exceeds ceiling"
            );
            return Self::deny(ctx, Denial::Authorization);
        }

        // ── 3. timestamp freshness ──
        let Ok(timestamp) = timestamp_raw.parse::<i64>() else {
            warn!(request_id = %ctx.request.id, "rejected request: timestamp is not an integer");
            return Self::deny(
                ctx,
                Denial::Validation("timestamp must be an integer number of Unix seconds".into()),
            );
        };
        let now = chrono::Utc::now().timestamp();
        let skew = now.abs_diff(timestamp);
        if skew > self.replay_window_secs {
            warn!(
                request_id = %ctx.request.id,
                skew_secs = skew,
                window_secs = self.replay_window_secs,
                "rejected request: timestamp outside replay window"
            );
            return Self::deny(ctx, Denial::Authorization);
        }

        // ── 4. credential lookup ──
        let credential = match self.directory.lookup(&access_key).await {
            Ok(Some(credential)) => credential,
            Ok(None) => {
                warn!(request_id = %ctx.request.id, "rejected request: unknown access key");
                return Self::deny(ctx, Denial::Authorization);
            }
            Err(e) => {
                error!(
                    request_id = %ctx.request.id,
                    error = %e,
                    "credential lookup failed"
                );
                return Self::deny(ctx, Denial::Authorization);
            }
        };

        // ── 5. signature verification ──
        // The raw header strings go into the hash, exactly as transmitted.
        if !verify_signature(
            &sign,
            &access_key,
            &credential.secret_key,
            &nonce_raw,
            &timestamp_raw,
        ) {
            warn!(request_id = %ctx.request.id, "rejected request: signature mismatch");
            return Self::deny(ctx, Denial::Authorization);
        }

        ctx.auth = Some(AuthContext::new(credential));
        ctx.phase = RequestPhase::Authenticated;
        StageVerdict::Continue
    }
}
