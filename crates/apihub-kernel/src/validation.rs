//! Gateway configuration container and startup validation.
//!
//! [`GatewayConfig`] aggregates everything the mediation pipeline needs to
//! know at startup (allow-list, auth bounds, upstream base) and exposes a
//! single [`validate()`](GatewayConfig::validate) method that checks all
//! structural invariants *before* any runtime resources are allocated.

use crate::error::ConfigError;
use std::net::IpAddr;

/// Default ceiling for the `nonce` header.
///
/// The platform keeps no replay cache; the ceiling and the freshness window
/// merely bound the replay surface.  See the authentication stage docs.
pub const DEFAULT_NONCE_CEILING: u64 = 10_000;

/// Default freshness window for the `timestamp` header, in seconds.
pub const DEFAULT_REPLAY_WINDOW_SECS: u64 = 300;

/// Default upstream dispatch timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

// ─────────────────────────────────────────────────────────────────────────────
// GatewayConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level gateway configuration.
///
/// Call [`validate()`](Self::validate) to check all structural invariants
/// before passing this config to the gateway runtime.  The config is
/// immutable once the server starts; stages receive copies of the values
/// they need at construction time.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Unique identifier for this gateway instance.
    pub id: String,
    /// Source addresses admitted by the access-control stage.
    pub allow_list: Vec<IpAddr>,
    /// Base URL requests are forwarded to, e.g. `http://10.0.0.5:8123`.
    /// Also the prefix under which interfaces are registered.
    pub upstream_base: String,
    /// Highest admissible `nonce` value (strictly-greater values are
    /// refused).
    pub nonce_ceiling: u64,
    /// Maximum allowed distance between the `timestamp` header and the
    /// current time, in seconds, in either direction.
    pub replay_window_secs: u64,
    /// Upstream dispatch timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl GatewayConfig {
    /// Construct a config with defaults for everything but identity and
    /// upstream base.
    pub fn new(id: impl Into<String>, upstream_base: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            allow_list: Vec::new(),
            upstream_base: upstream_base.into(),
            nonce_ceiling: DEFAULT_NONCE_CEILING,
            replay_window_secs: DEFAULT_REPLAY_WINDOW_SECS,
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Builder: admit one source address.
    pub fn with_allowed_ip(mut self, ip: IpAddr) -> Self {
        self.allow_list.push(ip);
        self
    }

    /// Builder: replace the whole allow-list.
    pub fn with_allow_list(mut self, ips: Vec<IpAddr>) -> Self {
        self.allow_list = ips;
        self
    }

    /// Builder: set the nonce ceiling.
    pub fn with_nonce_ceiling(mut self, ceiling: u64) -> Self {
        self.nonce_ceiling = ceiling;
        self
    }

    /// Builder: set the timestamp freshness window.
    pub fn with_replay_window_secs(mut self, secs: u64) -> Self {
        self.replay_window_secs = secs;
        self
    }

    /// Builder: set the upstream dispatch timeout.
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.request_timeout_ms = ms;
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Validation
    // ─────────────────────────────────────────────────────────────────────────

    /// Validate all structural invariants of this configuration.
    ///
    /// Returns `Ok(())` if the configuration is structurally sound and can be
    /// used to initialise the gateway runtime.  Returns the *first* detected
    /// [`ConfigError`] otherwise.
    ///
    /// Checks performed (in order):
    /// 1. Gateway id is non-empty.
    /// 2. The allow-list contains at least one address.
    /// 3. The upstream base starts with `http://` or `https://`.
    /// 4. The nonce ceiling is non-zero.
    /// 5. The replay window is non-zero.
    /// 6. The request timeout is non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // ── 1. Gateway id ────────────────────────────────────────────────────
        if self.id.trim().is_empty() {
            return Err(ConfigError::EmptyGatewayId);
        }

        // ── 2. Allow-list admits somebody ────────────────────────────────────
        if self.allow_list.is_empty() {
            return Err(ConfigError::EmptyAllowList);
        }

        // ── 3. Upstream base has an HTTP scheme ──────────────────────────────
        if !self.upstream_base.starts_with("http://")
            && !self.upstream_base.starts_with("https://")
        {
            return Err(ConfigError::InvalidUpstreamBase(self.upstream_base.clone()));
        }

        // ── 4. Nonce ceiling is non-zero ─────────────────────────────────────
        if self.nonce_ceiling == 0 {
            return Err(ConfigError::InvalidNonceCeiling);
        }

        // ── 5. Replay window is non-zero ─────────────────────────────────────
        if self.replay_window_secs == 0 {
            return Err(ConfigError::InvalidReplayWindow);
        }

        // ── 6. Timeout is non-zero ───────────────────────────────────────────
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
