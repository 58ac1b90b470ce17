//! Request submission and lookup handlers.
//!
//! Submission persists the caller's fields verbatim, answers with the new id,
//! and hands a summary to the notifier as a detached task. The row is
//! committed before that task is spawned; the task's outcome never affects
//! the response.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use remitdesk_core::{NewRequest, RemitError, RequestId};
use remitdesk_notify::RecipientId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::create_error_response;
use crate::{
    crypto::{validate_auth_payload, AuthPayload},
    AppState,
};

const SAVE_FAILED: &str = "Failed to save request";
const NOT_FOUND: &str = "Request not found";
const FETCH_FAILED: &str = "Failed to fetch data";
const VERIFICATION_FAILED: &str = "Verification failed";

/// Body of `POST /submit`.
///
/// The request fields are stored as-is. `user_id` only addresses the
/// notification; `auth_date` and `hash` are only read when verification is
/// enabled.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    /// Fields persisted to the store.
    #[serde(flatten)]
    pub request: NewRequest,
    /// Telegram chat to notify. Read after the row is stored, so a value
    /// that cannot address a chat only skips the notification.
    #[serde(default)]
    pub user_id: Option<Value>,
    /// Authentication timestamp, part of the signed payload.
    #[serde(default)]
    pub auth_date: Option<Value>,
    /// Signature over the authentication payload.
    #[serde(default)]
    pub hash: Option<Value>,
}

impl SubmitRequest {
    /// The notification recipient, if `user_id` names one.
    pub fn recipient(&self) -> Option<RecipientId> {
        match self.user_id.as_ref()? {
            Value::Number(n) => n.as_i64().map(RecipientId::Chat),
            Value::String(s) if !s.trim().is_empty() => Some(RecipientId::Username(s.clone())),
            _ => None,
        }
    }

    /// The authentication payload carried by this submission.
    pub fn auth_payload(&self) -> AuthPayload {
        AuthPayload::from_json_fields([
            ("auth_date", self.auth_date.as_ref()),
            ("hash", self.hash.as_ref()),
        ])
    }
}

/// Response from a successful submission.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// Always `true`.
    pub success: bool,
    /// Identifier assigned to the new request.
    pub id: RequestId,
}

/// Response when signature verification rejects a submission.
#[derive(Debug, Serialize)]
pub struct VerificationFailedResponse {
    /// Always `false`.
    pub success: bool,
    /// Fixed rejection message.
    pub message: String,
}

/// Creates a request and notifies the submitter.
///
/// # Errors
///
/// Returns appropriate HTTP status codes:
/// - 403: Signature verification failed (only when enabled)
/// - 500: Body could not be decoded, or the store failed
#[instrument(name = "submit_request", skip_all)]
pub async fn submit_request(
    State(state): State<AppState>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Response {
    let Json(submission) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            return create_error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                SAVE_FAILED,
                &RemitError::MalformedBody { reason: rejection.body_text() },
            );
        },
    };

    if let Some(secret) = state.auth.secret() {
        let result = validate_auth_payload(&submission.auth_payload(), secret);
        if !result.is_valid {
            let error = RemitError::VerificationFailed {
                reason: result.error_message.unwrap_or_default(),
            };
            warn!(code = error.code(), error = %error, "Submission rejected");
            return (
                StatusCode::FORBIDDEN,
                Json(VerificationFailedResponse {
                    success: false,
                    message: VERIFICATION_FAILED.to_string(),
                }),
            )
                .into_response();
        }
        debug!("Submission signature verified");
    }

    let id = match state.store.create(&submission.request).await {
        Ok(id) => id,
        Err(e) => {
            return create_error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                SAVE_FAILED,
                &RemitError::Storage(e),
            );
        },
    };

    info!(request_id = %id, "Request stored");

    match (submission.recipient(), &submission.user_id) {
        (Some(recipient), _) => {
            // Detached: the response below does not wait for delivery.
            state.notifier.dispatch(recipient, submission.request.summary());
        },
        (None, Some(user_id)) => {
            warn!(request_id = %id, %user_id, "user_id is not a chat id, skipping notification");
        },
        (None, None) => warn!(request_id = %id, "No user_id supplied, skipping notification"),
    }

    (StatusCode::OK, Json(SubmitResponse { success: true, id })).into_response()
}

/// Returns one request, without storage-only fields.
///
/// # Errors
///
/// - 404: No request with this id (including ids that are not integers)
/// - 500: The store failed
#[instrument(name = "get_request", skip(state))]
pub async fn get_request(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let not_found = |id: String| {
        create_error_response(StatusCode::NOT_FOUND, NOT_FOUND, &RemitError::RequestNotFound { id })
    };

    let Ok(request_id) = id.parse::<RequestId>() else {
        return not_found(id);
    };

    match state.store.find_by_id(request_id).await {
        Ok(Some(request)) => (StatusCode::OK, Json(request)).into_response(),
        Ok(None) => not_found(id),
        Err(e) => create_error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            FETCH_FAILED,
            &RemitError::Storage(e),
        ),
    }
}

/// Returns every request, without storage-only fields.
///
/// # Errors
///
/// - 500: The store failed
#[instrument(name = "list_requests", skip(state))]
pub async fn list_requests(State(state): State<AppState>) -> Response {
    match state.store.find_all().await {
        Ok(requests) => {
            debug!(count = requests.len(), "Listing requests");
            (StatusCode::OK, Json(requests)).into_response()
        },
        Err(e) => create_error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            FETCH_FAILED,
            &RemitError::Storage(e),
        ),
    }
}
