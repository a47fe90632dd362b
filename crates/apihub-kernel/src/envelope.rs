//! Upstream response envelope and chunked-body stream types.

use crate::upstream::UpstreamError;
use bytes::Bytes;
use futures::Stream;
use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;

/// One item of a chunked response body.
pub type ChunkResult = Result<Bytes, UpstreamError>;

/// Blanket trait for `Stream<Item = ChunkResult> + Send`
pub trait ChunkStream: Stream<Item = ChunkResult> + Send {}
impl<T> ChunkStream for T where T: Stream<Item = ChunkResult> + Send {}

/// Type erased chunk stream
pub type BoxChunkStream = Pin<Box<dyn ChunkStream>>;

// ─────────────────────────────────────────────────────────────────────────────
// ResponseBody
// ─────────────────────────────────────────────────────────────────────────────

/// Body of an upstream response as it is relayed to the caller.
pub enum ResponseBody {
    /// Body delivered incrementally.  This is the normal shape for dispatched
    /// responses; it is what the metering decorator wraps.
    Chunked(BoxChunkStream),
    /// Fully buffered body.  Synthetic responses use this; a *dispatched* 200
    /// arriving in this shape is an anomaly the forwarder flags.
    Full(Bytes),
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Chunked(_) => f.write_str("Chunked(..)"),
            ResponseBody::Full(b) => write!(f, "Full({} bytes)", b.len()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ResponseEnvelope
// ─────────────────────────────────────────────────────────────────────────────

/// An upstream response travelling back through the gateway.
#[derive(Debug)]
pub struct ResponseEnvelope {
    /// HTTP status code (100–599).
    pub status: u16,
    /// Response headers (header names are lowercased).
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: ResponseBody,
}

impl ResponseEnvelope {
    /// Construct an envelope with an empty buffered body.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: ResponseBody::Full(Bytes::new()),
        }
    }

    /// Builder helper: attach a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into().to_lowercase(), value.into());
        self
    }

    /// Builder helper: set a buffered body.
    pub fn with_full_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = ResponseBody::Full(body.into());
        self
    }

    /// Builder helper: set a chunked body.
    pub fn with_chunked_body(mut self, stream: impl ChunkStream + 'static) -> Self {
        self.body = ResponseBody::Chunked(Box::pin(stream));
        self
    }

    /// Whether the body streams.
    pub fn is_chunked(&self) -> bool {
        matches!(self.body, ResponseBody::Chunked(_))
    }
}
