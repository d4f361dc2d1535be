use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::identity::IdentityError;
use crate::llm_client::LlmError;
use crate::providers::ProviderError;
use crate::storage::StorageError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every variant renders the `{ success: false, message }` envelope. Upstream
/// failures are logged with detail and reported to the client generically.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Identity store unavailable: {0}")]
    UpstreamUnavailable(#[from] IdentityError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    /// Wraps an upstream failure with the message the client should see.
    #[error("{public}: {source}")]
    Operation {
        public: &'static str,
        #[source]
        source: Box<AppError>,
    },
}

impl AppError {
    /// Replaces the generic 500 message with an operation-specific one.
    /// Client-facing variants (400/401/404) are left untouched.
    pub fn with_public_message(self, public: &'static str) -> Self {
        match self {
            AppError::InvalidInput(_) | AppError::NotFound(_) | AppError::Unauthorized => self,
            other => AppError::Operation {
                public,
                source: Box::new(other),
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::InvalidInput(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::Unauthorized => "Unauthorized".to_string(),
            AppError::UpstreamUnavailable(e) => {
                tracing::error!("Identity store error: {e}");
                "Identity service unavailable".to_string()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                "A database error occurred".to_string()
            }
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                "An AI processing error occurred".to_string()
            }
            AppError::Provider(e) => {
                tracing::error!("Provider error: {e}");
                "An AI processing error occurred".to_string()
            }
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                "A storage error occurred".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
            AppError::Operation { public, source } => {
                tracing::error!("{public} cause: {source}");
                public.to_string()
            }
        };

        let body = Json(json!({
            "success": false,
            "message": message
        }));

        (status, body).into_response()
    }
}
