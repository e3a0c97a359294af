use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Failure of the recommendation core. Only the generative fallback boundary can fail;
/// the rule stages are total.
#[derive(Debug, Error)]
pub enum RecommendError {
    /// Fallback needed but no provider credential is configured. Not retryable.
    #[error("{0}")]
    Configuration(String),

    /// Provider failed or timed out. Not retried.
    #[error("{0}")]
    Provider(String),
}

impl RecommendError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, RecommendError::Configuration(_))
    }
}

impl From<LlmError> for RecommendError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::MissingApiKey => RecommendError::Configuration(
                "No rule-based match found and the generative provider is not configured"
                    .to_string(),
            ),
            other => RecommendError::Provider(format!("Generative provider error: {other}")),
        }
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Provider error: {0}")]
    Provider(String),
}

impl From<RecommendError> for AppError {
    fn from(err: RecommendError) -> Self {
        match err {
            RecommendError::Configuration(msg) => AppError::Configuration(msg),
            RecommendError::Provider(msg) => AppError::Provider(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Configuration(msg) => {
                tracing::warn!("Configuration error: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "AI_NOT_CONFIGURED",
                    msg.clone(),
                )
            }
            AppError::Provider(msg) => {
                tracing::error!("Provider error: {msg}");
                (StatusCode::BAD_GATEWAY, "AI_PROVIDER_ERROR", msg.clone())
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
