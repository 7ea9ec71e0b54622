#![allow(dead_code)]

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::recommend::engine::EngineError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No cached embedding for user {0}")]
    EmbeddingNotResolved(String),

    #[error("Embedding provider error: {0}")]
    EmbeddingProvider(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Vector query error: {0}")]
    VectorQuery(String),

    #[error("Dimension mismatch: cached {actual}, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::EmbeddingNotResolved(user_id) => AppError::EmbeddingNotResolved(user_id),
            EngineError::Provider(e) => AppError::EmbeddingProvider(e.to_string()),
            EngineError::Cache(e) => AppError::Cache(e.to_string()),
            EngineError::Query(e) => AppError::VectorQuery(e.to_string()),
            EngineError::DimensionMismatch { expected, actual } => {
                AppError::DimensionMismatch { expected, actual }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::EmbeddingNotResolved(user_id) => (
                StatusCode::NOT_FOUND,
                "EMBEDDING_NOT_RESOLVED",
                format!("No cached embedding for user {user_id}; ingest a profile first"),
            ),
            AppError::EmbeddingProvider(msg) => {
                tracing::error!("Embedding provider error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "EMBEDDING_PROVIDER_ERROR",
                    "The embedding provider request failed".to_string(),
                )
            }
            AppError::Cache(msg) => {
                tracing::error!("Cache error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CACHE_ERROR",
                    "An embedding cache error occurred".to_string(),
                )
            }
            AppError::VectorQuery(msg) => {
                tracing::error!("Vector query error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "VECTOR_QUERY_ERROR",
                    "A vector store error occurred".to_string(),
                )
            }
            AppError::DimensionMismatch { expected, actual } => {
                tracing::error!("Dimension mismatch: cached {actual}, expected {expected}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DIMENSION_MISMATCH",
                    "Cached embedding does not match the configured dimension".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_error_class() {
        let resolved = AppError::EmbeddingNotResolved("u1".to_string()).into_response();
        assert_eq!(resolved.status(), StatusCode::NOT_FOUND);

        let provider = AppError::EmbeddingProvider("boom".to_string()).into_response();
        assert_eq!(provider.status(), StatusCode::BAD_GATEWAY);

        let cache = AppError::Cache("boom".to_string()).into_response();
        assert_eq!(cache.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let query = AppError::VectorQuery("boom".to_string()).into_response();
        assert_eq!(query.status(), StatusCode::BAD_GATEWAY);

        let validation = AppError::Validation("user_id cannot be empty".to_string()).into_response();
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_engine_errors_map_onto_http_taxonomy() {
        let app: AppError = EngineError::EmbeddingNotResolved("u1".to_string()).into();
        assert!(matches!(app, AppError::EmbeddingNotResolved(user) if user == "u1"));

        let app: AppError = EngineError::DimensionMismatch {
            expected: 768,
            actual: 512,
        }
        .into();
        assert!(matches!(
            app,
            AppError::DimensionMismatch {
                expected: 768,
                actual: 512
            }
        ));
    }
}
