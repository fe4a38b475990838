//! Error types for the HTTP service

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use crash_relay_core::{DispatchError, RelayError};
use tracing::error;

/// Message returned when GitHub credentials are not configured
pub const NOT_CONFIGURED_MESSAGE: &str =
    "GitHub integration not configured. Ensure GH_PAT, GH_OWNER, and GH_REPO are set.";

/// Message returned for unexpected failures
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Webhook handler errors with HTTP status code mapping
///
/// | Failure | Status |
/// |---|---|
/// | bad or missing signature | `403 Forbidden` |
/// | body is not a JSON object | `400 Bad Request` |
/// | GitHub settings missing | `500 Internal Server Error` |
/// | GitHub rejected the dispatch | `502 Bad Gateway` with upstream body |
/// | GitHub unreachable | `502 Bad Gateway` |
/// | anything else | `500 Internal Server Error`, generic message |
///
/// Sentry does not redeliver on 4xx, so only the 5xx responses lead to a
/// retry on the sender side.
#[derive(Debug, thiserror::Error)]
pub enum WebhookHandlerError {
    /// Relay pipeline failure
    #[error("Processing failed: {0}")]
    Relay(#[from] RelayError),

    /// Unexpected internal server error
    ///
    /// Details are logged; the client only sees a generic message.
    #[error("Internal server error: {message}")]
    InternalError { message: String },
}

impl IntoResponse for WebhookHandlerError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Relay(RelayError::InvalidSignature { .. }) => (
                StatusCode::FORBIDDEN,
                serde_json::json!({ "error": "Invalid signature" }),
            ),
            Self::Relay(RelayError::MalformedPayload { .. }) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": "Invalid JSON payload" }),
            ),
            Self::Relay(RelayError::Dispatch(DispatchError::Configuration { missing })) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": NOT_CONFIGURED_MESSAGE, "missing": missing }),
            ),
            Self::Relay(RelayError::Dispatch(DispatchError::Upstream { status, body })) => (
                StatusCode::BAD_GATEWAY,
                serde_json::json!({
                    "error": format!("GitHub API returned {}", status),
                    "detail": body,
                }),
            ),
            Self::Relay(RelayError::Dispatch(DispatchError::Transport { message })) => (
                StatusCode::BAD_GATEWAY,
                serde_json::json!({
                    "error": format!("Network error: {}", message),
                    "detail": message,
                }),
            ),
            Self::Relay(RelayError::Dispatch(
                ref e @ (DispatchError::InvalidEndpoint { .. } | DispatchError::HttpClient { .. }),
            )) => {
                error!(
                    error = %e,
                    category = ?e.error_category(),
                    "Dispatch could not be attempted"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": INTERNAL_ERROR_MESSAGE }),
                )
            }
            Self::InternalError { ref message } => {
                // Log detailed error server-side but return generic message to client
                error!(error = %message, "Internal server error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": INTERNAL_ERROR_MESSAGE }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl ServiceError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BindFailed { .. } => 1,
            Self::ServerFailed { .. } => 2,
            Self::Configuration(_) => 3,
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
