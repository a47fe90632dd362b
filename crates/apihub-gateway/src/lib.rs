//! `apihub-gateway` — APIHub mediation gateway runtime.
//!
//! This crate provides the concrete implementations of the mediation kernel
//! contracts defined in `apihub-kernel`:
//!
//! | Kernel contract | Implementation |
//! |-----------------|----------------|
//! | `PipelineStage` | [`stage::RequestLogStage`], [`stage::AccessControlStage`], [`stage::AuthenticationStage`], [`stage::InterfaceLookupStage`] |
//! | `UserDirectory` | [`services::InMemoryUserDirectory`] |
//! | `InterfaceRegistry` | [`services::InMemoryInterfaceRegistry`] |
//! | `UsageMeter` | [`services::InMemoryUsageMeter`] |
//! | `Upstream` | [`upstream::HttpUpstream`] |
//!
//! The [`server::GatewayServer`] wires everything together into an axum HTTP
//! service; [`forward::Forwarder`] and [`meter`] handle the response path.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use apihub_gateway::server::{GatewayServer, GatewayServices};
//! use apihub_gateway::services::{
//!     InMemoryInterfaceRegistry, InMemoryUsageMeter, InMemoryUserDirectory,
//! };
//! use apihub_gateway::upstream::HttpUpstream;
//! use apihub_kernel::{Credential, GatewayConfig, HttpMethod, InterfaceDescriptor};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = GatewayConfig::new("my-gateway", "http://10.0.0.5:8123")
//!         .with_allowed_ip("127.0.0.1".parse().unwrap());
//!
//!     let services = GatewayServices {
//!         directory: Arc::new(
//!             InMemoryUserDirectory::new()
//!                 .with_credential(Credential::new(1, "ak-demo", "sk-demo")),
//!         ),
//!         registry: Arc::new(InMemoryInterfaceRegistry::new().with_interface(
//!             InterfaceDescriptor::new(1, "http://10.0.0.5:8123/api/name", HttpMethod::Get),
//!         )),
//!         meter: Arc::new(InMemoryUsageMeter::new()),
//!         upstream: Arc::new(HttpUpstream::new("http://10.0.0.5:8123", 30_000)),
//!     };
//!
//!     GatewayServer::new(config, 3000).start(services).await.unwrap();
//! }
//! ```

pub mod error;
pub mod forward;
pub mod meter;
pub mod server;
pub mod services;
pub mod stage;
pub mod upstream;

// Re-export the kernel contracts for convenience.
pub use apihub_kernel as kernel;
