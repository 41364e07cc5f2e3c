//! Mapping of service errors onto HTTP responses.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::time::Duration;

use crate::error::TollgateError;

/// Whole seconds to advertise in `Retry-After`, rounded up and at least 1.
pub fn retry_after_secs(wait: Duration) -> u64 {
    (wait.as_secs_f64().ceil() as u64).max(1)
}

impl IntoResponse for TollgateError {
    fn into_response(self) -> Response {
        match self {
            TollgateError::MissingIdentity => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "detail": self.to_string() })),
            )
                .into_response(),
            TollgateError::RateLimited { wait } => (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_after_secs(wait).to_string())],
                Json(json!({ "detail": self.to_string() })),
            )
                .into_response(),
            TollgateError::Config(_) | TollgateError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": "Internal server error" })),
            )
                .into_response(),
        }
    }
}
