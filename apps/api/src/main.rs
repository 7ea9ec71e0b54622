mod config;
mod embedding_client;
mod errors;
mod recommend;
mod routes;
mod state;
mod vector_store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::embedding_client::GeminiEmbeddingClient;
use crate::recommend::cache::RedisEmbeddingCache;
use crate::recommend::engine::RecommendationEngine;
use crate::recommend::fanout::{FanOutCoordinator, DEFAULT_QUERY_LIMIT};
use crate::routes::build_router;
use crate::state::AppState;
use crate::vector_store::ChromaClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (aborts on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Hireon recommendation API v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Initialize the Redis-backed embedding cache
    let redis = redis::Client::open(config.redis_url.clone())?;
    let cache = Arc::new(RedisEmbeddingCache::new(redis));
    info!("Redis embedding cache initialized");

    // Initialize the embedding provider
    let provider = Arc::new(GeminiEmbeddingClient::new(
        config.gemini_api_key.clone(),
        config.embedding_dimension,
    ));
    info!(
        "Embedding provider initialized (model: {}, dimension: {})",
        embedding_client::EMBEDDING_MODEL,
        config.embedding_dimension
    );

    // Initialize the vector store client. An unreachable store is not fatal
    // at startup; requests will surface it per call.
    let vector_store = Arc::new(ChromaClient::new(config.chroma_url.clone()));
    match vector_store.heartbeat().await {
        Ok(_) => info!("Vector store reachable at {}", config.chroma_url),
        Err(e) => tracing::warn!("Vector store not reachable at startup: {e}"),
    }

    // Build the recommendation engine
    let engine = RecommendationEngine::new(
        cache,
        provider,
        FanOutCoordinator::new(vector_store.clone(), DEFAULT_QUERY_LIMIT),
        config.embedding_dimension,
    );

    // Build app state
    let state = AppState {
        engine: Arc::new(engine),
        vector_store,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
