//! Error types for the mediation kernel contract.
//!
//! [`Denial`] covers every reason a request can be refused at *request time*
//! and maps each reason to the status code the caller sees.  [`ConfigError`]
//! covers failures detected at *definition time*, before the gateway accepts
//! any traffic.  Collaborator call failures (directory, registry, meter) are
//! carried by [`ServiceError`] and converted to denials by the stages that
//! observe them.

use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Denial
// ─────────────────────────────────────────────────────────────────────────────

/// Why a request was refused during mediation.
///
/// Authorization and routing refusals deliberately carry no detail: the
/// caller sees only the status code, and the precise reason lives in server
/// logs.  Validation refusals name the malformed input, since the header
/// contract is public.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum Denial {
    /// Required auth material is missing or unparseable.  Rendered as 400
    /// with the message in a JSON body.
    #[error("{0}")]
    Validation(String),

    /// The caller failed an access-control or authentication check.
    /// Rendered as 403 with an empty body.
    #[error("request is not authorized")]
    Authorization,

    /// No registered, enabled interface matches the request.  Rendered
    /// identically to [`Denial::Authorization`]: 403, empty body.
    #[error("no enabled interface matches this request")]
    Routing,

    /// Dispatch to the upstream service failed at the transport level.
    /// Rendered as 500 with an empty body; the detail stays in logs.
    #[error("upstream dispatch failed: {0}")]
    Upstream(String),
}

impl Denial {
    /// HTTP status code this denial is rendered with.
    pub fn status(&self) -> u16 {
        match self {
            Denial::Validation(_) => 400,
            Denial::Authorization | Denial::Routing => 403,
            Denial::Upstream(_) => 500,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ServiceError
// ─────────────────────────────────────────────────────────────────────────────

/// A platform collaborator (user directory, interface registry, usage meter)
/// failed to answer.
///
/// The message is for operators; it never reaches the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("platform service call failed: {0}")]
pub struct ServiceError(pub String);

impl ServiceError {
    /// Build from anything displayable.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ConfigError
// ─────────────────────────────────────────────────────────────────────────────

/// Definition-time configuration error, detected by
/// [`GatewayConfig::validate()`](crate::validation::GatewayConfig::validate)
/// before any runtime resources are allocated.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// The gateway `id` field is empty or whitespace-only.
    #[error("gateway id cannot be empty")]
    EmptyGatewayId,

    /// The allow-list admits nobody; the gateway would refuse every request.
    #[error("allow-list must contain at least one address")]
    EmptyAllowList,

    /// The upstream base URL is empty or lacks an HTTP scheme.
    #[error("upstream base '{0}' must start with http:// or https://")]
    InvalidUpstreamBase(String),

    /// A zero ceiling would refuse every positive nonce.
    #[error("nonce ceiling must be greater than 0")]
    InvalidNonceCeiling,

    /// A zero window would refuse every timestamped request.
    #[error("replay window must be greater than 0 seconds")]
    InvalidReplayWindow,

    /// `request_timeout_ms` is zero, which would fail every dispatch.
    #[error("request timeout must be greater than 0 ms")]
    InvalidTimeout,
}
