pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::recommend::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Recommendation API
        .route("/api/v1/recommendations", post(handlers::handle_recommend))
        .route(
            "/api/v1/recommendations/status",
            get(handlers::handle_engine_status),
        )
        // Embedding ingest and status
        .route(
            "/api/v1/embeddings",
            post(handlers::handle_ingest_embedding),
        )
        .route(
            "/api/v1/embeddings/:user_id",
            get(handlers::handle_embedding_status),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::embedding_client::GeminiEmbeddingClient;
    use crate::recommend::cache::RedisEmbeddingCache;
    use crate::recommend::engine::RecommendationEngine;
    use crate::recommend::fanout::{FanOutCoordinator, DEFAULT_QUERY_LIMIT};
    use crate::vector_store::ChromaClient;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    // Real client types, but nothing here opens a connection: the routes
    // under test return before any backend is touched.
    fn make_state() -> AppState {
        let config = Config {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            chroma_url: "http://127.0.0.1:8000".to_string(),
            gemini_api_key: "test-key".to_string(),
            embedding_dimension: 768,
            port: 0,
            rust_log: "info".to_string(),
        };

        let cache = Arc::new(RedisEmbeddingCache::new(
            redis::Client::open(config.redis_url.clone()).unwrap(),
        ));
        let provider = Arc::new(GeminiEmbeddingClient::new(
            config.gemini_api_key.clone(),
            config.embedding_dimension,
        ));
        let vector_store = Arc::new(ChromaClient::new(config.chroma_url.clone()));
        let engine = RecommendationEngine::new(
            cache,
            provider,
            FanOutCoordinator::new(vector_store.clone(), DEFAULT_QUERY_LIMIT),
            config.embedding_dimension,
        );

        AppState {
            engine: Arc::new(engine),
            vector_store,
            config,
        }
    }

    #[tokio::test]
    async fn test_health_route_responds() {
        let app = build_router(make_state());

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["service"], "hireon-api");
    }

    #[tokio::test]
    async fn test_blank_user_id_is_rejected_up_front() {
        let app = build_router(make_state());

        let request = Request::post("/api/v1/recommendations")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"user_id": "  "}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_blank_profile_text_is_rejected_up_front() {
        let app = build_router(make_state());

        let request = Request::post("/api/v1/embeddings")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"user_id": "u1", "profile_text": ""}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = build_router(make_state());

        let response = app
            .oneshot(Request::get("/api/v1/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
