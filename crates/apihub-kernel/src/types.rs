//! Core data types for the mediation kernel contract.
//!
//! These types are shared across all mediation traits
//! ([`PipelineStage`](super::stage::PipelineStage),
//! [`UserDirectory`](super::directory::UserDirectory),
//! [`InterfaceRegistry`](super::registry::InterfaceRegistry),
//! [`Upstream`](super::upstream::Upstream))
//! and carry no runtime dependencies beyond `serde`, `bytes`, and `std`.

use crate::directory::Credential;
use crate::registry::InterfaceDescriptor;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

// ─────────────────────────────────────────────────────────────────────────────
// Auth header names
// ─────────────────────────────────────────────────────────────────────────────

// Header names are matched byte-exact against these lowercase constants;
// [`InboundRequest::with_header`] lowercases names on insertion.

/// Header carrying the caller's public access key.
pub const HEADER_ACCESS_KEY: &str = "accesskey";
/// Header carrying the per-request nonce.
pub const HEADER_NONCE: &str = "nonce";
/// Header carrying the request timestamp in Unix seconds.
pub const HEADER_TIMESTAMP: &str = "timestamp";
/// Header carrying the request signature.
pub const HEADER_SIGN: &str = "sign";
/// Proxy-supplied header listing the original client address first.
pub const HEADER_FORWARDED_FOR: &str = "x-forwarded-for";

// ─────────────────────────────────────────────────────────────────────────────
// HTTP primitives
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP method, covering the standard verbs used in REST and proxy scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    /// Case-insensitive parse from a string slice.
    pub fn from_str_ci(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            "HEAD" => Some(HttpMethod::Head),
            "OPTIONS" => Some(HttpMethod::Options),
            _ => None,
        }
    }

    /// Return the standard uppercase string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inbound request
// ─────────────────────────────────────────────────────────────────────────────

/// An inbound request flowing through the mediation pipeline.
///
/// All fields use owned, allocation-friendly types so the struct can be sent
/// across async task boundaries without lifetime complications.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    /// Unique identifier for correlating this request across logs.
    pub id: String,
    /// Request path, e.g. `/api/name` (no query string).
    pub path: String,
    /// Raw query string, if any.
    pub query: Option<String>,
    /// HTTP method.
    pub method: HttpMethod,
    /// HTTP headers (header names are lowercased).
    pub headers: HashMap<String, String>,
    /// Peer socket address, when the transport supplies one.
    pub remote_addr: Option<SocketAddr>,
    /// Raw body bytes.
    pub body: Bytes,
}

impl InboundRequest {
    /// Construct a minimal request with the given id, path, and method.
    pub fn new(id: impl Into<String>, path: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            query: None,
            method,
            headers: HashMap::new(),
            remote_addr: None,
            body: Bytes::new(),
        }
    }

    /// Builder helper: attach a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into().to_lowercase(), value.into());
        self
    }

    /// Builder helper: set the query string.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Builder helper: set the peer socket address.
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Builder helper: set the body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Look up a header by its lowercase name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Resolve the source address used for access-control decisions.
    ///
    /// Prefers the first comma-separated entry of `x-forwarded-for` when it
    /// parses as an IP address, falling back to the peer socket address.
    /// Returns `None` when neither yields an address.
    pub fn source_address(&self) -> Option<IpAddr> {
        if let Some(raw) = self.header(HEADER_FORWARDED_FOR) {
            if let Some(first) = raw.split(',').next() {
                if let Ok(ip) = first.trim().parse::<IpAddr>() {
                    return Some(ip);
                }
            }
        }
        self.remote_addr.map(|addr| addr.ip())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request lifecycle
// ─────────────────────────────────────────────────────────────────────────────

/// Where a request currently stands in the mediation lifecycle.
///
/// ```text
/// Received → IpChecked → Authenticated → InterfaceResolved → Forwarded → Complete
///                │             │                │                │
///                ▼             ▼                ▼                ▼
///            DeniedIp     DeniedAuth    DeniedInterface    UpstreamError
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum RequestPhase {
    /// Accepted by the server, no checks run yet.
    Received,
    /// Source address passed the allow-list.
    IpChecked,
    /// Signature verified; an [`AuthContext`] is attached.
    Authenticated,
    /// A registered, enabled interface matched the request.
    InterfaceResolved,
    /// Dispatched to the upstream service.
    Forwarded,
    /// Response accepted for relay; the (possibly metered) body streams to
    /// the caller from here.
    Complete,
    /// Refused by the access-control stage.
    DeniedIp,
    /// Refused by the authentication stage.
    DeniedAuth,
    /// Refused by the interface-lookup stage.
    DeniedInterface,
    /// Upstream dispatch failed at the transport level.
    UpstreamError,
}

impl RequestPhase {
    /// Whether this phase ends the lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestPhase::Complete
                | RequestPhase::DeniedIp
                | RequestPhase::DeniedAuth
                | RequestPhase::DeniedInterface
                | RequestPhase::UpstreamError
        )
    }

    /// Stable lowercase name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestPhase::Received => "received",
            RequestPhase::IpChecked => "ip_checked",
            RequestPhase::Authenticated => "authenticated",
            RequestPhase::InterfaceResolved => "interface_resolved",
            RequestPhase::Forwarded => "forwarded",
            RequestPhase::Complete => "complete",
            RequestPhase::DeniedIp => "denied_ip",
            RequestPhase::DeniedAuth => "denied_auth",
            RequestPhase::DeniedInterface => "denied_interface",
            RequestPhase::UpstreamError => "upstream_error",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth context
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication result attached to a request after signature verification.
///
/// Created only by the authentication stage; the interface descriptor is
/// filled in by the interface-lookup stage; the whole context is consumed
/// (moved) by the response-metering decorator.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The credential that signed this request.
    pub credential: Credential,
    /// Populated after interface resolution; `None` before it.
    pub interface: Option<InterfaceDescriptor>,
}

impl AuthContext {
    /// Create a context for a freshly verified credential.
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            interface: None,
        }
    }

    /// Id of the authenticated caller.
    pub fn user_id(&self) -> i64 {
        self.credential.id
    }

    /// Id of the resolved interface, if resolution has happened.
    pub fn interface_id(&self) -> Option<i64> {
        self.interface.as_ref().map(|i| i.id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request context
// ─────────────────────────────────────────────────────────────────────────────

/// Mutable context that flows through the stage pipeline for a single request.
///
/// Stages read from and write to this context, enabling downstream stages to
/// build on decisions made by upstream stages (e.g. the interface-lookup stage
/// attaches its match to the auth context set by the authentication stage).
#[derive(Debug)]
pub struct RequestContext {
    /// The inbound request.
    pub request: InboundRequest,
    /// Set by the authentication stage; `None` while unauthenticated.
    pub auth: Option<AuthContext>,
    /// Current lifecycle phase.  Stages advance it as checks pass.
    pub phase: RequestPhase,
}

impl RequestContext {
    /// Create a fresh context from an inbound request.
    pub fn new(request: InboundRequest) -> Self {
        Self {
            request,
            auth: None,
            phase: RequestPhase::Received,
        }
    }

    /// Move the auth context out, leaving `None`.
    ///
    /// The metering decorator takes ownership this way; afterwards the
    /// request can no longer be re-metered.
    pub fn take_auth(&mut self) -> Option<AuthContext> {
        self.auth.take()
    }
}

// =============================================================================
// Tests
// =============================================================================
