//! HTTP request handlers.
//!
//! - `requests` - submission, point lookup and listing
//! - `health` - health, readiness and liveness probes
//!
//! Failures are answered with `{error, code}`. The `error` text is a fixed,
//! operation-level message; the underlying cause is only logged.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use remitdesk_core::RemitError;
use serde::Serialize;
use tracing::{error, warn};

pub mod health;
pub mod requests;

pub use health::{health_check, liveness_check, readiness_check};
pub use requests::{get_request, list_requests, submit_request};

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable, operation-level message
    pub error: String,
    /// Error code from the taxonomy (E1001-E3001)
    pub code: String,
}

/// Builds an error response and logs the underlying cause.
///
/// `message` is what the client sees; the error itself stays server-side.
pub(crate) fn create_error_response(
    status: StatusCode,
    message: &str,
    error: &RemitError,
) -> Response {
    if error.is_client_error() {
        warn!(code = error.code(), error = %error, "Request rejected");
    } else {
        error!(code = error.code(), error = %error, "Request failed");
    }

    let body = ErrorResponse { error: message.to_string(), code: error.code().to_string() };

    (status, Json(body)).into_response()
}
