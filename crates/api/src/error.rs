//! Error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use orchestrator::GenerationError;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("database error: {0}")]
    Database(#[from] database::DatabaseError),

    #[error("attempt not found: {0}")]
    AttemptNotFound(uuid::Uuid),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::AttemptNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Generation(err) => match err {
                GenerationError::Validation(_) => StatusCode::BAD_REQUEST,
                GenerationError::AlreadyGenerating | GenerationError::AlreadyAttempted => {
                    StatusCode::CONFLICT
                }
                GenerationError::PaymentFailed(_) => StatusCode::PAYMENT_REQUIRED,
                GenerationError::TimedOut => StatusCode::REQUEST_TIMEOUT,
                GenerationError::Cancelled => StatusCode::GONE,
                GenerationError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
                GenerationError::Provider { .. }
                | GenerationError::Network { .. }
                | GenerationError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            ApiError::Unauthorized => {
                warn!("Unauthorized request");
                serde_json::json!({
                    "error": {
                        "message": "Unauthorized",
                        "type": "auth_error"
                    }
                })
            }
            ApiError::Generation(err) => {
                if status.is_server_error() {
                    warn!("Generation failed: {}", err);
                }
                serde_json::json!({
                    "error": {
                        "code": err.code(),
                        "message": err.user_message(),
                        "action": err.suggested_action(),
                        "type": "generation_error"
                    }
                })
            }
            ApiError::AttemptNotFound(id) => serde_json::json!({
                "error": {
                    "message": format!("No running attempt {}", id),
                    "type": "not_found"
                }
            }),
            ApiError::Database(err) => {
                error!("Database error: {}", err);
                serde_json::json!({
                    "error": {
                        "message": "Internal error",
                        "type": "server_error"
                    }
                })
            }
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                serde_json::json!({
                    "error": {
                        "message": "Internal error",
                        "type": "server_error"
                    }
                })
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
