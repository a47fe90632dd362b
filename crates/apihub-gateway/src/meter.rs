//! Response metering decorator.
//!
//! Wraps the chunked body of a successful (200) response so that the first
//! chunk to arrive records exactly one invocation against the resolved
//! interface and caller.  Recording failures are logged and swallowed; the
//! caller's bytes are never held hostage by the accounting backend.
//!
//! Rules the decorator enforces:
//!
//! - at most one recording per response, even if the meter call itself fails,
//! - a zero-chunk body records nothing (nothing was delivered),
//! - a dropped response stream stops pulling from the upstream, so a caller
//!   that disconnects mid-body is charged at most the one recording already
//!   made,
//! - a *buffered* 200 body is an anomaly (dispatched responses stream); it is
//!   relayed with status 500, bytes unmodified, and no recording.

use apihub_kernel::{
    AuthContext, BoxChunkStream, ChunkResult, ResponseBody, ResponseEnvelope, UsageMeter,
};
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Wrap a 200 envelope so its body stream meters itself on first delivery.
///
/// Takes the [`AuthContext`] by value: whoever holds the context holds the
/// sole right to account this request.
pub fn decorate(
    envelope: ResponseEnvelope,
    auth: AuthContext,
    meter: Arc<dyn UsageMeter>,
    request_id: &str,
) -> ResponseEnvelope {
    let Some(interface_id) = auth.interface_id() else {
        warn!(
            request_id = %request_id,
            "200 response with no resolved interface; relaying unmetered"
        );
        return envelope;
    };
    let user_id = auth.user_id();

    let ResponseEnvelope {
        status,
        headers,
        body,
    } = envelope;

    match body {
        ResponseBody::Full(bytes) => {
            // Dispatched responses stream; a buffered 200 body means the
            // transport did something unexpected.  Flag it to the caller
            // without touching the bytes, and do not charge for it.
            error!(
                request_id = %request_id,
                bytes = bytes.len(),
                "200 response body arrived buffered, not chunked; relaying as 500 unmetered"
            );
            ResponseEnvelope {
                status: 500,
                headers,
                body: ResponseBody::Full(bytes),
            }
        }
        ResponseBody::Chunked(inner) => ResponseEnvelope {
            status,
            headers,
            body: ResponseBody::Chunked(Box::pin(metered_chunks(
                inner,
                interface_id,
                user_id,
                meter,
                request_id.to_string(),
            ))),
        },
    }
}

/// The wrapped chunk stream: records once on the first delivered chunk,
/// logs every chunk, and relays stream errors in place.
fn metered_chunks(
    mut inner: BoxChunkStream,
    interface_id: i64,
    user_id: i64,
    meter: Arc<dyn UsageMeter>,
    request_id: String,
) -> impl Stream<Item = ChunkResult> {
    async_stream::stream! {
        let mut recorded = false;
        while let Some(item) = inner.next().await {
            match item {
                Ok(chunk) => {
                    if !recorded {
                        // Flag flips before the await so the recording can
                        // never run twice, even if the meter call fails.
                        recorded = true;
                        if let Err(e) = meter.record_invocation(interface_id, user_id).await {
                            warn!(
                                request_id = %request_id,
                                interface_id,
                                user_id,
                                error = %e,
                                "usage metering failed; response continues"
                            );
                        }
                    }
                    info!(
                        request_id = %request_id,
                        bytes = chunk.len(),
                        body = %String::from_utf8_lossy(&chunk),
                        "← response chunk"
                    );
                    yield Ok(chunk);
                }
                Err(e) => {
                    error!(
                        request_id = %request_id,
                        error = %e,
                        "response stream failed mid-body"
                    );
                    yield Err(e);
                }
            }
        }
    }
}
