// ── Gateway errors ──
//
// `GatewayError` is what `serve` can fail with. `ApiError` is what a handler
// answers with: a status code plus `{ "error": message }`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use seele_core::CoreError;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A JSON error response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let status = match &err {
            CoreError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            CoreError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
            CoreError::ConnectionFailed { .. } | CoreError::MalformedPayload { .. } => {
                StatusCode::BAD_GATEWAY
            }
            CoreError::Cancelled | CoreError::Config { .. } | CoreError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<seele_api::Error> for ApiError {
    fn from(err: seele_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(status = %self.status, error = %self.message, "upstream request failed");
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
