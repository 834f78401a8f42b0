use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use moked_types::protocol::ErrorBody;

/// Failures inside the agent loop or its upstream calls.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("completions request failed: {0}")]
    Llm(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed upstream payload: {0}")]
    Decode(String),
}

/// Unified API error type for all route handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request from the client.
    BadRequest(String),
    /// Server-side misconfiguration (missing credentials). The message is
    /// intentionally actionable; this surface is operator-facing.
    Config(String),
    /// Anything that failed after the request was accepted.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: msg,
                    details: None,
                },
            ),
            ApiError::Config(msg) => {
                tracing::error!("configuration error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: msg,
                        details: None,
                    },
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "Failed to process request".to_string(),
                        details: Some(msg),
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<AgentError> for ApiError {
    fn from(e: AgentError) -> Self {
        ApiError::Internal(e.to_string())
    }
}
