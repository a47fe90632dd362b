//! Denial-to-HTTP rendering.
//!
//! Maps the kernel's [`Denial`] taxonomy onto the wire contract:
//!
//! | denial          | status | body                      |
//! |-----------------|--------|---------------------------|
//! | `Validation`    | 400    | `{"code":400,"msg":"…"}`  |
//! | `Authorization` | 403    | empty                     |
//! | `Routing`       | 403    | empty                     |
//! | `Upstream`      | 500    | empty                     |
//!
//! Only validation failures explain themselves to the caller; everything
//! else is deliberately opaque, with detail in the server logs.

use apihub_kernel::Denial;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Render a denial as the HTTP response the caller receives.
pub fn denial_response(denial: &Denial) -> Response {
    let status = StatusCode::from_u16(denial.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match denial {
        Denial::Validation(msg) => (
            status,
            Json(json!({
                "code": 400,
                "msg": msg,
            })),
        )
            .into_response(),
        _ => status.into_response(),
    }
}
