use std::sync::Arc;

use crate::config::Config;
use crate::recommend::engine::RecommendationEngine;
use crate::vector_store::ChromaClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
    /// Direct handle to the vector store for the status probe; request-path
    /// queries go through the engine.
    pub vector_store: Arc<ChromaClient>,
    pub config: Config,
}
