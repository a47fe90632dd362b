//! APIHub gateway — entry point.
//!
//! Reads configuration from environment variables, seeds the in-memory
//! platform services, and starts the axum-based mediation server.
//!
//! # Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_PORT` | `3000` | TCP port to listen on. |
//! | `GATEWAY_ID` | `apihub-gateway` | Instance identifier used in logs. |
//! | `UPSTREAM_BASE_URL` | *(required)* | Base URL requests are forwarded to, e.g. `http://10.0.0.5:8123`. |
//! | `GATEWAY_ALLOWED_IPS` | `127.0.0.1` | Comma-separated source-address allow-list. |
//! | `GATEWAY_CREDENTIALS` | *(none)* | Comma-separated `id:accessKey:secretKey` entries. |
//! | `GATEWAY_INTERFACES` | *(none)* | Comma-separated `id:METHOD:path` entries, registered under the upstream base. |
//! | `NONCE_CEILING` | `10000` | Highest admissible `nonce` header value. |
//! | `REPLAY_WINDOW_SECS` | `300` | Timestamp freshness window in seconds. |
//! | `REQUEST_TIMEOUT_MS` | `30000` | Upstream dispatch timeout. |

use apihub_gateway::server::{GatewayServer, GatewayServices};
use apihub_gateway::services::{
    InMemoryInterfaceRegistry, InMemoryUsageMeter, InMemoryUserDirectory,
};
use apihub_gateway::upstream::HttpUpstream;
use apihub_kernel::{Credential, GatewayConfig, HttpMethod, InterfaceDescriptor};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("apihub_gateway=info".parse().unwrap()),
        )
        .init();

    let port: u16 = std::env::var("GATEWAY_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);

    let gateway_id =
        std::env::var("GATEWAY_ID").unwrap_or_else(|_| "apihub-gateway".to_string());

    let Ok(upstream_base) = std::env::var("UPSTREAM_BASE_URL") else {
        eprintln!("UPSTREAM_BASE_URL must be set (e.g. http://10.0.0.5:8123)");
        std::process::exit(1);
    };

    let allow_list: Vec<IpAddr> = std::env::var("GATEWAY_ALLOWED_IPS")
        .unwrap_or_else(|_| "127.0.0.1".to_string())
        .split(',')
        .filter_map(|s| {
            let entry = s.trim();
            if entry.is_empty() {
                return None;
            }
            match entry.parse() {
                Ok(ip) => Some(ip),
                Err(_) => {
                    warn!(entry = %entry, "ignoring malformed allow-list entry");
                    None
                }
            }
        })
        .collect();

    let nonce_ceiling: u64 = std::env::var("NONCE_CEILING")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(apihub_kernel::DEFAULT_NONCE_CEILING);

    let replay_window_secs: u64 = std::env::var("REPLAY_WINDOW_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(apihub_kernel::DEFAULT_REPLAY_WINDOW_SECS);

    let request_timeout_ms: u64 = std::env::var("REQUEST_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(apihub_kernel::DEFAULT_TIMEOUT_MS);

    // Build and validate the gateway configuration.
    let config = GatewayConfig::new(gateway_id, &upstream_base)
        .with_allow_list(allow_list)
        .with_nonce_ceiling(nonce_ceiling)
        .with_replay_window_secs(replay_window_secs)
        .with_timeout_ms(request_timeout_ms);

    if let Err(e) = config.validate() {
        eprintln!("invalid gateway configuration: {e}");
        std::process::exit(1);
    }

    // Seed the user directory.  Malformed entries are skipped by index, not
    // by content, so secret material never reaches the logs.
    let mut directory = InMemoryUserDirectory::new();
    for (i, entry) in std::env::var("GATEWAY_CREDENTIALS")
        .unwrap_or_default()
        .split(',')
        .enumerate()
    {
        if entry.trim().is_empty() {
            continue;
        }
        match parse_credential(entry) {
            Some(credential) => directory = directory.with_credential(credential),
            None => warn!(index = i, "ignoring malformed credential entry"),
        }
    }
    if directory.is_empty() {
        warn!(
            "GATEWAY_CREDENTIALS is not set — no caller can authenticate. \
             Seed at least one id:accessKey:secretKey entry."
        );
    }

    // Seed the interface registry under the upstream base.
    let mut registry = InMemoryInterfaceRegistry::new();
    for entry in std::env::var("GATEWAY_INTERFACES")
        .unwrap_or_default()
        .split(',')
    {
        if entry.trim().is_empty() {
            continue;
        }
        match parse_interface(entry, &upstream_base) {
            Some(descriptor) => registry = registry.with_interface(descriptor),
            None => warn!(entry = %entry.trim(), "ignoring malformed interface entry"),
        }
    }

    info!(
        port = port,
        upstream_base = %config.upstream_base,
        allowed_ips = config.allow_list.len(),
        credentials = directory.len(),
        interfaces = registry.len(),
        "APIHub gateway configuration loaded"
    );

    let services = GatewayServices {
        directory: Arc::new(directory),
        registry: Arc::new(registry),
        meter: Arc::new(InMemoryUsageMeter::new()),
        upstream: Arc::new(HttpUpstream::new(
            &config.upstream_base,
            config.request_timeout_ms,
        )),
    };

    let server = GatewayServer::new(config, port);
    if let Err(e) = server.start(services).await {
        eprintln!("Gateway error: {e}");
        std::process::exit(1);
    }
}

/// Parse one `id:accessKey:secretKey` credential entry.
fn parse_credential(entry: &str) -> Option<Credential> {
    let mut parts = entry.splitn(3, ':');
    let id = parts.next()?.trim().parse::<i64>().ok()?;
    let access_key = parts.next()?.trim();
    let secret_key = parts.next()?.trim();
    if access_key.is_empty() || secret_key.is_empty() {
        return None;
    }
    Some(Credential::new(id, access_key, secret_key))
}

/// Parse one `id:METHOD:path` interface entry and register it under the
/// upstream base URL.
fn parse_interface(entry: &str, upstream_base: &str) -> Option<InterfaceDescriptor> {
    let mut parts = entry.splitn(3, ':');
    let id = parts.next()?.trim().parse::<i64>().ok()?;
    let method = HttpMethod::from_str_ci(parts.next()?.trim())?;
    let path = parts.next()?.trim();
    if !path.starts_with('/') {
        return None;
    }
    let url = format!("{}{}", upstream_base.trim_end_matches('/'), path);
    Some(InterfaceDescriptor::new(id, url, method))
}
