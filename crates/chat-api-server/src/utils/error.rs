use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::models::chat::ProviderId;

/// Provider gateway failure kinds.
///
/// The four variants are deliberately distinct so the caller can decide
/// whether to retry (`Unreachable`, `Timeout`), change the request
/// (`Rejected`, `UnknownProvider`), or fall back to the other backend.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Provider {provider} unreachable: {message}")]
    Unreachable {
        provider: ProviderId,
        message: String,
    },

    #[error("Provider {provider} rejected the request ({status}): {message}")]
    Rejected {
        provider: ProviderId,
        status: u16,
        message: String,
    },

    #[error("Provider {provider} timed out after {timeout_seconds}s")]
    Timeout {
        provider: ProviderId,
        timeout_seconds: u64,
    },
}

impl LlmError {
    /// Classify a transport-level reqwest failure for one backend.
    /// HTTP-status rejections are handled separately by the backends, which
    /// still have the response body at hand.
    pub fn from_transport(provider: ProviderId, timeout_seconds: u64, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout {
                provider,
                timeout_seconds,
            }
        } else {
            LlmError::Unreachable {
                provider,
                message: err.to_string(),
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::Unauthorized(msg) => {
                tracing::warn!("Unauthorized: {}", msg);
                (StatusCode::UNAUTHORIZED, "Unauthorized", msg)
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, "BadRequest", msg)
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "InternalError", msg)
            }
            ApiError::Llm(err) => {
                let msg = err.to_string();
                match err {
                    LlmError::UnknownProvider(_) => {
                        tracing::warn!("LLM error: {}", msg);
                        (StatusCode::BAD_REQUEST, "UnknownProvider", msg)
                    }
                    LlmError::Rejected { .. } => {
                        tracing::error!("LLM error: {}", msg);
                        (StatusCode::BAD_GATEWAY, "ProviderRejected", msg)
                    }
                    LlmError::Unreachable { .. } => {
                        tracing::error!("LLM error: {}", msg);
                        (StatusCode::SERVICE_UNAVAILABLE, "ProviderUnreachable", msg)
                    }
                    LlmError::Timeout { .. } => {
                        tracing::error!("LLM error: {}", msg);
                        (StatusCode::SERVICE_UNAVAILABLE, "ProviderTimeout", msg)
                    }
                }
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}
