use apihub_gateway::server::{GatewayServer, GatewayServices};
use apihub_kernel::{
    compute_signature, ChunkResult, Credential, GatewayConfig, HttpMethod, InterfaceDescriptor,
    ResponseEnvelope, UpstreamError,
};
use apihub_testing::{RecordingDirectory, RecordingMeter, RecordingRegistry, ScriptedUpstream};
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use bytes::Bytes;
use chrono::Utc;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

const UPSTREAM_BASE: &str = "http://upstream.internal:8123";
const ACCESS_KEY: &str = "ak-test";
const SECRET_KEY: &str = "sk-test";
const USER_ID: i64 = 7;
const INTERFACE_ID: i64 = 3;
const CLIENT_ADDR: &str = "127.0.0.1:50000";

// ─────────────────────────────────────────────────────────────────────────────
// Harness
// ─────────────────────────────────────────────────────────────────────────────

/// A built gateway app plus handles on the instrumented services behind it.
struct Gateway {
    app: Router,
    directory: Arc<RecordingDirectory>,
    registry: Arc<RecordingRegistry>,
    meter: Arc<RecordingMeter>,
    upstream: Arc<ScriptedUpstream>,
}

fn default_registry() -> RecordingRegistry {
    RecordingRegistry::new().with_interface(InterfaceDescriptor::new(
        INTERFACE_ID,
        format!("{UPSTREAM_BASE}/api/name"),
        HttpMethod::Get,
    ))
}

impl Gateway {
    /// Gateway allowing `127.0.0.1`, with one credential and one published
    /// `GET /api/name` interface.
    fn new() -> Self {
        Self::build(default_registry(), RecordingMeter::new())
    }

    fn with_registry(registry: RecordingRegistry) -> Self {
        Self::build(registry, RecordingMeter::new())
    }

    fn with_meter(meter: RecordingMeter) -> Self {
        Self::build(default_registry(), meter)
    }

    fn build(registry: RecordingRegistry, meter: RecordingMeter) -> Self {
        let directory = Arc::new(
            RecordingDirectory::new()
                .with_credential(Credential::new(USER_ID, ACCESS_KEY, SECRET_KEY)),
        );
        let registry = Arc::new(registry);
        let meter = Arc::new(meter);
        let upstream = Arc::new(ScriptedUpstream::new());

        let config = GatewayConfig::new("gateway-test", UPSTREAM_BASE)
            .with_allowed_ip("127.0.0.1".parse().unwrap());
        let app = GatewayServer::new(config, 0).build_app(GatewayServices {
            directory: directory.clone(),
            registry: registry.clone(),
            meter: meter.clone(),
            upstream: upstream.clone(),
        });

        Self {
            app,
            directory,
            registry,
            meter,
            upstream,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request builders
// ─────────────────────────────────────────────────────────────────────────────

/// The four auth headers for a freshly signed request (nonce 42, now).
fn signed_headers() -> Vec<(String, String)> {
    let timestamp = Utc::now().timestamp().to_string();
    let sign = compute_signature(ACCESS_KEY, SECRET_KEY, "42", &timestamp);
    vec![
        ("accesskey".into(), ACCESS_KEY.into()),
        ("nonce".into(), "42".into()),
        ("timestamp".into(), timestamp),
        ("sign".into(), sign),
    ]
}

fn request_from(
    addr: &str,
    method: &str,
    path: &str,
    headers: &[(String, String)],
    body: Body,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    for (k, v) in headers {
        builder = builder.header(k, v);
    }
    let mut req = builder.body(body).unwrap();
    let addr: SocketAddr = addr.parse().unwrap();
    req.extensions_mut().insert(ConnectInfo(addr));
    req
}

fn request(method: &str, path: &str, headers: &[(String, String)]) -> Request<Body> {
    request_from(CLIENT_ADDR, method, path, headers, Body::empty())
}

fn signed_get(path: &str) -> Request<Body> {
    request("GET", path, &signed_headers())
}

// ─────────────────────────────────────────────────────────────────────────────
// Response helpers
// ─────────────────────────────────────────────────────────────────────────────

async fn body_bytes(resp: Response) -> Bytes {
    axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap()
}

fn chunked(status: u16, chunks: &[&'static [u8]]) -> ResponseEnvelope {
    let items: Vec<ChunkResult> = chunks
        .iter()
        .copied()
        .map(|c| Ok(Bytes::from_static(c)))
        .collect();
    ResponseEnvelope::new(status)
        .with_header("content-type", "application/json")
        .with_chunked_body(futures::stream::iter(items))
}

// ─────────────────────────────────────────────────────────────────────────────
// Liveness
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_endpoint_answers_without_auth() {
    let gw = Gateway::new();
    let resp = gw.send(request("GET", "/health", &[])).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let v: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(v["status"], "ok");
}

// ─────────────────────────────────────────────────────────────────────────────
// Access control
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unlisted_source_is_denied_before_any_collaborator_call() {
    let gw = Gateway::new();
    let req = request_from(
        "10.9.9.9:50000",
        "GET",
        "/api/name",
        &signed_headers(),
        Body::empty(),
    );
    let resp = gw.send(req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(body_bytes(resp).await.is_empty());
    assert_eq!(gw.directory.lookup_count(), 0);
    assert_eq!(gw.registry.find_count(), 0);
    assert_eq!(gw.upstream.dispatch_count(), 0);
}

#[tokio::test]
async fn forwarded_for_header_overrides_the_socket_address() {
    // The proxy header names an allow-listed client even though the socket
    // peer (the proxy itself) is not listed.
    let gw = Gateway::new();
    gw.upstream.script(Ok(chunked(200, &[b"ok"])));

    let mut headers = signed_headers();
    headers.push(("x-forwarded-for".into(), "127.0.0.1".into()));
    let req = request_from("10.9.9.9:50000", "GET", "/api/name", &headers, Body::empty());

    assert_eq!(gw.send(req).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn forwarded_for_header_can_also_unmask_a_denied_client() {
    let gw = Gateway::new();
    let mut headers = signed_headers();
    headers.push(("x-forwarded-for".into(), "10.9.9.9".into()));
    let resp = gw.send(request("GET", "/api/name", &headers)).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(gw.directory.lookup_count(), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Authentication
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_auth_header_is_a_400_with_json_detail() {
    let gw = Gateway::new();
    let headers: Vec<(String, String)> = signed_headers()
        .into_iter()
        .filter(|(k, _)| k != "sign")
        .collect();
    let resp = gw.send(request("GET", "/api/name", &headers)).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let v: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(v["code"], 400);
    assert_eq!(v["msg"], "missing required header 'sign'");
    assert_eq!(gw.directory.lookup_count(), 0);
}

#[tokio::test]
async fn nonce_over_the_ceiling_is_denied_without_lookup() {
    let gw = Gateway::new();
    let timestamp = Utc::now().timestamp().to_string();
    let sign = compute_signature(ACCESS_KEY, SECRET_KEY, "10001", &timestamp);
    let headers = vec![
        ("accesskey".to_string(), ACCESS_KEY.to_string()),
        ("nonce".to_string(), "10001".to_string()),
        ("timestamp".to_string(), timestamp),
        ("sign".to_string(), sign),
    ];
    let resp = gw.send(request("GET", "/api/name", &headers)).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(body_bytes(resp).await.is_empty());
    assert_eq!(gw.directory.lookup_count(), 0);
}

#[tokio::test]
async fn stale_timestamp_is_denied_without_lookup() {
    let gw = Gateway::new();
    let stale = (Utc::now().timestamp() - 301).to_string();
    let sign = compute_signature(ACCESS_KEY, SECRET_KEY, "42", &stale);
    let headers = vec![
        ("accesskey".to_string(), ACCESS_KEY.to_string()),
        ("nonce".to_string(), "42".to_string()),
        ("timestamp".to_string(), stale),
        ("sign".to_string(), sign),
    ];
    let resp = gw.send(request("GET", "/api/name", &headers)).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(gw.directory.lookup_count(), 0);
}

#[tokio::test]
async fn tampered_signature_is_denied_after_exactly_one_lookup() {
    let gw = Gateway::new();
    let timestamp = Utc::now().timestamp().to_string();
    let wrong = compute_signature(ACCESS_KEY, "sk-stolen-guess", "42", &timestamp);
    let headers = vec![
        ("accesskey".to_string(), ACCESS_KEY.to_string()),
        ("nonce".to_string(), "42".to_string()),
        ("timestamp".to_string(), timestamp),
        ("sign".to_string(), wrong),
    ];
    let resp = gw.send(request("GET", "/api/name", &headers)).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(body_bytes(resp).await.is_empty());
    assert_eq!(gw.directory.lookup_count(), 1);
    assert_eq!(gw.registry.find_count(), 0);
    assert_eq!(gw.upstream.dispatch_count(), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Interface resolution
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unregistered_interface_is_denied_after_auth() {
    let gw = Gateway::new();
    let resp = gw.send(signed_get("/api/other")).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(body_bytes(resp).await.is_empty());
    assert_eq!(gw.directory.lookup_count(), 1);
    assert_eq!(gw.registry.find_count(), 1);
    assert_eq!(gw.upstream.dispatch_count(), 0);
}

#[tokio::test]
async fn disabled_interface_is_indistinguishable_from_unregistered() {
    let gw = Gateway::with_registry(RecordingRegistry::new().with_interface(
        InterfaceDescriptor::new(
            INTERFACE_ID,
            format!("{UPSTREAM_BASE}/api/name"),
            HttpMethod::Get,
        )
        .disabled(),
    ));
    let resp = gw.send(signed_get("/api/name")).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(body_bytes(resp).await.is_empty());
    assert_eq!(gw.upstream.dispatch_count(), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Forwarding and relay
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn valid_request_relays_the_upstream_response_and_meters_once() {
    let gw = Gateway::new();
    gw.upstream
        .script(Ok(chunked(200, &[b"{\"name\":", b"\"ada\"", b"}"])));

    let resp = gw.send(signed_get("/api/name")).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(&body_bytes(resp).await[..], b"{\"name\":\"ada\"}");
    assert_eq!(gw.meter.recordings(), vec![(INTERFACE_ID, USER_ID)]);
}

#[tokio::test]
async fn dispatch_carries_path_query_headers_and_body() {
    let gw = Gateway::with_registry(RecordingRegistry::new().with_interface(
        InterfaceDescriptor::new(
            INTERFACE_ID,
            format!("{UPSTREAM_BASE}/api/echo"),
            HttpMethod::Post,
        ),
    ));
    gw.upstream.script(Ok(chunked(200, &[b"ok"])));

    let mut headers = signed_headers();
    headers.push(("content-type".into(), "application/json".into()));
    let req = request_from(
        CLIENT_ADDR,
        "POST",
        "/api/echo?v=2",
        &headers,
        Body::from("{\"q\":1}"),
    );
    assert_eq!(gw.send(req).await.status(), StatusCode::OK);

    let seen = gw.upstream.seen_requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].path, "/api/echo");
    assert_eq!(seen[0].query.as_deref(), Some("v=2"));
    assert_eq!(seen[0].method, HttpMethod::Post);
    assert_eq!(seen[0].header("content-type"), Some("application/json"));
    assert_eq!(&seen[0].body[..], b"{\"q\":1}");
}

#[tokio::test]
async fn replaying_the_same_signed_request_succeeds_and_meters_again() {
    // No nonce-seen store exists: a verbatim replay inside the freshness
    // window is accepted and accounted as a fresh invocation.
    let gw = Gateway::new();
    gw.upstream.script(Ok(chunked(200, &[b"one"])));
    gw.upstream.script(Ok(chunked(200, &[b"two"])));

    let headers = signed_headers();
    let first = gw.send(request("GET", "/api/name", &headers)).await;
    let second = gw.send(request("GET", "/api/name", &headers)).await;

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(&body_bytes(first).await[..], b"one");
    assert_eq!(&body_bytes(second).await[..], b"two");
    assert_eq!(
        gw.meter.recordings(),
        vec![(INTERFACE_ID, USER_ID), (INTERFACE_ID, USER_ID)]
    );
}

#[tokio::test]
async fn non_200_response_is_relayed_byte_identical_and_unmetered() {
    let gw = Gateway::new();
    gw.upstream
        .script(Ok(chunked(404, &[b"{\"error\":\"missing\"}"])));

    let resp = gw.send(signed_get("/api/name")).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(&body_bytes(resp).await[..], b"{\"error\":\"missing\"}");
    assert!(gw.meter.recordings().is_empty());
}

#[tokio::test]
async fn metering_failure_does_not_disturb_the_response() {
    let gw = Gateway::with_meter(RecordingMeter::failing());
    gw.upstream.script(Ok(chunked(200, &[b"hello ", b"world"])));

    let resp = gw.send(signed_get("/api/name")).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(&body_bytes(resp).await[..], b"hello world");
    // One attempt was made and its failure was swallowed.
    assert_eq!(gw.meter.recordings().len(), 1);
}

#[tokio::test]
async fn buffered_200_body_is_relayed_as_500_with_bytes_intact() {
    let gw = Gateway::new();
    gw.upstream
        .script(Ok(ResponseEnvelope::new(200).with_full_body("{\"name\":\"ada\"}")));

    let resp = gw.send(signed_get("/api/name")).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(&body_bytes(resp).await[..], b"{\"name\":\"ada\"}");
    assert!(gw.meter.recordings().is_empty());
}

#[tokio::test]
async fn upstream_transport_failure_is_an_empty_500() {
    let gw = Gateway::new();
    gw.upstream
        .script(Err(UpstreamError::Connect("connection refused".into())));

    let resp = gw.send(signed_get("/api/name")).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_bytes(resp).await.is_empty());
    assert_eq!(gw.upstream.dispatch_count(), 1);
    assert!(gw.meter.recordings().is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Method handling
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unsupported_method_is_a_405() {
    let gw = Gateway::new();
    let resp = gw.send(request("TRACE", "/api/name", &signed_headers())).await;

    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(gw.directory.lookup_count(), 0);
}
