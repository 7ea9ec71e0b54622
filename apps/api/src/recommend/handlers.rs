//! Axum route handlers for the Recommendation API.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::recommend::engine::EngineError;
use crate::recommend::merge::RankedRecommendation;
use crate::recommend::metrics::{IngestMetrics, RequestMetrics};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub user_id: String,
    pub search_query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub recommendations: Vec<RankedRecommendation>,
    pub metrics: RequestMetrics,
}

#[derive(Debug, Deserialize)]
pub struct IngestEmbeddingRequest {
    pub user_id: String,
    pub profile_text: String,
}

#[derive(Debug, Serialize)]
pub struct IngestEmbeddingResponse {
    pub status: String,
    pub dimension: usize,
    pub metrics: IngestMetrics,
}

#[derive(Debug, Serialize)]
pub struct EmbeddingStatusResponse {
    pub user_id: String,
    pub dimension: usize,
    pub model: String,
    pub cached_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct EngineStatusResponse {
    pub status: String,
    pub vector_store_heartbeat_ns: u64,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/recommendations
///
/// Ranks all known job postings against the user's cached profile
/// embedding, optionally steered toward a search query.
pub async fn handle_recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> Result<Json<RecommendResponse>, AppError> {
    if request.user_id.trim().is_empty() {
        return Err(AppError::Validation("user_id cannot be empty".to_string()));
    }

    let outcome = state
        .engine
        .recommend(&request.user_id, request.search_query.as_deref())
        .await?;

    Ok(Json(RecommendResponse {
        recommendations: outcome.recommendations,
        metrics: outcome.metrics,
    }))
}

/// POST /api/v1/embeddings
///
/// Embeds a user's profile text and caches the vector. Safe to repeat: a
/// re-ingest overwrites the previous entry.
pub async fn handle_ingest_embedding(
    State(state): State<AppState>,
    Json(request): Json<IngestEmbeddingRequest>,
) -> Result<Json<IngestEmbeddingResponse>, AppError> {
    if request.user_id.trim().is_empty() {
        return Err(AppError::Validation("user_id cannot be empty".to_string()));
    }
    if request.profile_text.trim().is_empty() {
        return Err(AppError::Validation(
            "profile_text cannot be empty".to_string(),
        ));
    }

    let outcome = state
        .engine
        .ingest(&request.user_id, &request.profile_text)
        .await?;

    Ok(Json(IngestEmbeddingResponse {
        status: "stored".to_string(),
        dimension: outcome.dimension,
        metrics: outcome.metrics,
    }))
}

/// GET /api/v1/embeddings/:user_id
///
/// Reports whether a cached embedding exists for the user, and its
/// provenance when it does.
pub async fn handle_embedding_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<EmbeddingStatusResponse>, AppError> {
    let entry = state
        .engine
        .cached_profile(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No cached embedding for user {user_id}")))?;

    Ok(Json(EmbeddingStatusResponse {
        user_id,
        dimension: entry.vector.dim(),
        model: entry.model,
        cached_at: entry.cached_at,
    }))
}

/// GET /api/v1/recommendations/status
///
/// Liveness probe for the engine's vector store dependency.
pub async fn handle_engine_status(
    State(state): State<AppState>,
) -> Result<Json<EngineStatusResponse>, AppError> {
    let heartbeat = state
        .vector_store
        .heartbeat()
        .await
        .map_err(EngineError::from)?;

    Ok(Json(EngineStatusResponse {
        status: "ok".to_string(),
        vector_store_heartbeat_ns: heartbeat,
    }))
}
