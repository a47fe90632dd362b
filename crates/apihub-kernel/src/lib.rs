//! Request-mediation kernel contract.
//!
//! This crate defines the *trait interfaces and data types* for the APIHub
//! mediation gateway.  No concrete implementations live here — those belong
//! in `apihub-gateway` (runtime) and deployment-specific crates.
//!
//! # Architecture mapping
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              apihub-kernel  (this crate)                    │
//! │  PipelineStage trait     UserDirectory trait                │
//! │  InterfaceRegistry trait UsageMeter trait  Upstream trait   │
//! │  InboundRequest / RequestContext / ResponseEnvelope         │
//! │  GatewayConfig + validate()   Denial   sign()/verify()      │
//! └──────────────────────────┬──────────────────────────────────┘
//!                            │  depends on
//! ┌──────────────────────────▼──────────────────────────────────┐
//! │              apihub-gateway  (runtime crate)                │
//! │  AccessControlStage / AuthenticationStage /                 │
//! │  InterfaceLookupStage / RequestLogStage   StagePipeline     │
//! │  Forwarder + metering decorator                             │
//! │  HttpUpstream  (reqwest dispatch)                           │
//! │  GatewayServer  (axum HTTP server)                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use apihub_kernel::GatewayConfig;
//!
//! let config = GatewayConfig::new("my-gateway", "http://10.0.0.5:8123")
//!     .with_allowed_ip("127.0.0.1".parse().unwrap())
//!     .with_nonce_ceiling(10_000)
//!     .with_replay_window_secs(300);
//!
//! config.validate().expect("gateway config is valid");
//! ```

pub mod directory;
pub mod envelope;
pub mod error;
pub mod metering;
pub mod registry;
pub mod sign;
pub mod stage;
pub mod types;
pub mod upstream;
pub mod validation;

// ── Flat re-exports ────────────────────────────────────────────────────────

pub use directory::{Credential, UserDirectory};
pub use envelope::{BoxChunkStream, ChunkResult, ChunkStream, ResponseBody, ResponseEnvelope};
pub use error::{ConfigError, Denial, ServiceError};
pub use metering::UsageMeter;
pub use registry::{InterfaceDescriptor, InterfaceRegistry};
pub use sign::{compute_signature, verify_signature};
pub use stage::{PipelineStage, StageOrder, StageVerdict};
pub use types::{
    AuthContext, HEADER_ACCESS_KEY, HEADER_FORWARDED_FOR, HEADER_NONCE, HEADER_SIGN,
    HEADER_TIMESTAMP, HttpMethod, InboundRequest, RequestContext, RequestPhase,
};
pub use upstream::{Upstream, UpstreamError};
pub use validation::{
    DEFAULT_NONCE_CEILING, DEFAULT_REPLAY_WINDOW_SECS, DEFAULT_TIMEOUT_MS, GatewayConfig,
};
