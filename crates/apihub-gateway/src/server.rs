//! Axum-based HTTP mediation server.
//!
//! [`GatewayServer`] wires the stage pipeline, forwarder, and platform
//! services into a running axum service.  Every path except `/health` falls
//! through to the mediation handler, which runs the pipeline and relays the
//! upstream response.
//!
//! # Endpoints
//!
//! | Method | Path      | Description                                  |
//! |--------|-----------|----------------------------------------------|
//! | `GET`  | `/health` | Liveness check; always `200 OK`.             |
//! | `ANY`  | `/*`      | Mediated forward to the configured upstream. |

use crate::error::denial_response;
use crate::forward::Forwarder;
use crate::stage::{
    AccessControlStage, AuthenticationStage, InterfaceLookupStage, RequestLogStage, StagePipeline,
};
use apihub_kernel::{
    GatewayConfig, HttpMethod, InboundRequest, InterfaceRegistry, PipelineStage, RequestContext,
    RequestPhase, ResponseBody, ResponseEnvelope, StageVerdict, Upstream, UsageMeter,
    UserDirectory,
};
use axum::{
    Json, Router,
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Inbound bodies are buffered before relay; cap matches axum's default
/// extractor limit.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// ─────────────────────────────────────────────────────────────────────────────
// Shared application state
// ─────────────────────────────────────────────────────────────────────────────

/// Shared state injected into every axum handler via [`State`] extractor.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<StagePipeline>,
    forwarder: Arc<Forwarder>,
}

// ─────────────────────────────────────────────────────────────────────────────
// GatewayServices
// ─────────────────────────────────────────────────────────────────────────────

/// The platform collaborators the gateway is wired to.
///
/// Each member is a trait object so deployments can swap in database-backed
/// or remote implementations without touching the server.
pub struct GatewayServices {
    /// Credential lookup.
    pub directory: Arc<dyn UserDirectory>,
    /// Published-interface catalog.
    pub registry: Arc<dyn InterfaceRegistry>,
    /// Invocation accounting.
    pub meter: Arc<dyn UsageMeter>,
    /// Transport to the upstream service.
    pub upstream: Arc<dyn Upstream>,
}

// ─────────────────────────────────────────────────────────────────────────────
// GatewayServer
// ─────────────────────────────────────────────────────────────────────────────

/// High-level mediation server encapsulating the stage pipeline and
/// forwarding path.
pub struct GatewayServer {
    config: GatewayConfig,
    port: u16,
}

impl GatewayServer {
    /// Create a new server from a validated-or-validatable configuration.
    pub fn new(config: GatewayConfig, port: u16) -> Self {
        Self { config, port }
    }

    /// Build the axum [`Router`] wired to the provided services.
    ///
    /// This method validates the config, assembles the four standard stages,
    /// and constructs the forwarder.  Call [`start()`](Self::start) to bind
    /// and serve.
    pub fn build_app(&self, services: GatewayServices) -> Router {
        self.config.validate().expect("invalid gateway config");

        let stages: Vec<Arc<dyn PipelineStage>> = vec![
            Arc::new(RequestLogStage::new()),
            Arc::new(AccessControlStage::new(
                self.config.allow_list.iter().copied(),
            )),
            Arc::new(AuthenticationStage::new(
                services.directory,
                self.config.nonce_ceiling,
                self.config.replay_window_secs,
            )),
            Arc::new(InterfaceLookupStage::new(
                services.registry,
                &self.config.upstream_base,
            )),
        ];
        let pipeline = StagePipeline::new(stages);
        let forwarder = Forwarder::new(services.upstream, services.meter);

        let state = AppState {
            pipeline: Arc::new(pipeline),
            forwarder: Arc::new(forwarder),
        };

        Router::new()
            .route("/health", get(health_handler))
            .fallback(mediate_handler)
            .with_state(state)
    }

    /// Bind the server to `0.0.0.0:{port}` and serve until the process exits.
    ///
    /// Serving with connect info is what gives the access-control stage a
    /// peer address to fall back on when no proxy header is present.
    pub async fn start(self, services: GatewayServices) -> std::io::Result<()> {
        let app = self.build_app(services);
        let addr = format!("0.0.0.0:{}", self.port);
        info!(addr = %addr, gateway_id = %self.config.id, "APIHub gateway starting");
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /health` — liveness probe.
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "apihub-gateway" }))
}

/// Fallback handler: run the mediation pipeline, then forward and relay.
async fn mediate_handler(State(state): State<AppState>, request: Request) -> Response {
    let started = Instant::now();

    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0);
    let (parts, body) = request.into_parts();

    let Some(method) = HttpMethod::from_str_ci(parts.method.as_str()) else {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            Json(json!({ "error": format!("method '{}' is not supported", parts.method) })),
        )
            .into_response();
    };

    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "failed to buffer request body");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "failed to read request body" })),
            )
                .into_response();
        }
    };

    let request_id = Uuid::new_v4().to_string();
    let mut req = InboundRequest::new(&request_id, parts.uri.path(), method).with_body(body);
    if let Some(query) = parts.uri.query() {
        req = req.with_query(query);
    }
    for (name, value) in &parts.headers {
        if let Ok(v) = value.to_str() {
            req = req.with_header(name.as_str(), v);
        }
    }
    if let Some(addr) = remote_addr {
        req = req.with_remote_addr(addr);
    }

    let mut ctx = RequestContext::new(req);

    if let StageVerdict::Reject(denial) = state.pipeline.run(&mut ctx).await {
        info!(
            request_id = %request_id,
            phase = ctx.phase.as_str(),
            status = denial.status(),
            latency_ms = elapsed_ms(started),
            "← request denied"
        );
        return denial_response(&denial);
    }

    let envelope = match state.forwarder.forward(&mut ctx).await {
        Ok(envelope) => envelope,
        Err(denial) => {
            info!(
                request_id = %request_id,
                phase = ctx.phase.as_str(),
                status = denial.status(),
                latency_ms = elapsed_ms(started),
                "← request denied"
            );
            return denial_response(&denial);
        }
    };
    ctx.phase = RequestPhase::Complete;

    info!(
        request_id = %request_id,
        status = envelope.status,
        chunked = envelope.is_chunked(),
        latency_ms = elapsed_ms(started),
        "← upstream response relayed"
    );
    build_axum_response(envelope)
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn build_axum_response(envelope: ResponseEnvelope) -> Response {
    let status =
        StatusCode::from_u16(envelope.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = axum::response::Response::builder().status(status);
    for (k, v) in &envelope.headers {
        builder = builder.header(k, v);
    }
    let body = match envelope.body {
        ResponseBody::Full(bytes) => Body::from(bytes),
        ResponseBody::Chunked(stream) => Body::from_stream(stream),
    };
    builder
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
