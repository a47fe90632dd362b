//! HTTP upstream transport.
//!
//! [`HttpUpstream`] dispatches mediated requests to the configured upstream
//! base URL and relays the response body as a chunk stream, without parsing
//! or modifying it.  The mediator is intentionally transparent: headers and
//! bytes pass through verbatim, so upstream API changes need no gateway
//! changes.

use apihub_kernel::{HttpMethod, InboundRequest, ResponseEnvelope, Upstream, UpstreamError};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

/// Forwards requests to a single upstream HTTP service.
pub struct HttpUpstream {
    base_url: String,
    timeout_ms: u64,
    client: Client,
}

impl HttpUpstream {
    /// Create a transport for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .expect("failed to build reqwest client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_ms,
            client,
        }
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    #[instrument(skip(self, request), fields(path = %request.path))]
    async fn dispatch(&self, request: &InboundRequest) -> Result<ResponseEnvelope, UpstreamError> {
        let mut url = format!("{}{}", self.base_url, request.path);
        if let Some(query) = &request.query {
            url.push('?');
            url.push_str(query);
        }
        debug!(url = %url, "dispatching to upstream");

        // Match on a reference to avoid moving out of the borrowed request.
        let mut builder = match &request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
            HttpMethod::Patch => self.client.patch(&url),
            HttpMethod::Delete => self.client.delete(&url),
            HttpMethod::Head => self.client.head(&url),
            HttpMethod::Options => self.client.request(reqwest::Method::OPTIONS, &url),
            _ => self.client.get(&url),
        };

        // Relay headers from the original request, except the ones the
        // client recomputes for the new connection.
        for (key, value) in &request.headers {
            if key == "host" || key == "content-length" {
                continue;
            }
            builder = builder.header(key, value);
        }

        // Send the body if present; its content-type rides along with the
        // relayed headers.
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let upstream_resp = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout(self.timeout_ms)
            } else {
                UpstreamError::Connect(e.to_string())
            }
        })?;

        let status = upstream_resp.status().as_u16();
        let mut envelope = ResponseEnvelope::new(status);
        for (name, value) in upstream_resp.headers() {
            if let Ok(v) = value.to_str() {
                // reqwest header names are already lowercase.
                envelope.headers.insert(name.to_string(), v.to_string());
            }
        }

        let body = upstream_resp
            .bytes_stream()
            .map(|item| item.map_err(|e| UpstreamError::Stream(e.to_string())));
        Ok(envelope.with_chunked_body(body))
    }
}
