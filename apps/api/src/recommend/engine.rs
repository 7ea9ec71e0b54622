//! Recommendation Orchestrator — the composition root for a single
//! recommendation or ingest request.
//!
//! `recommend` never computes the profile embedding inline: the cache is
//! the only source it reads from, and a miss is surfaced as
//! `EngineError::EmbeddingNotResolved` rather than silently re-embedding.
//! Profile embeddings enter the cache exclusively through `ingest`, which
//! is safe to retry — a repeat simply overwrites the entry with an
//! equivalent vector.
//!
//! All stage timing lives here, wrapped around the external calls. The
//! ranking itself stays pure and clock-free.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::embedding_client::{EmbedTask, EmbeddingError, EmbeddingProvider};
use crate::recommend::cache::{CacheError, CachedEmbedding, EmbeddingCache};
use crate::recommend::fanout::FanOutCoordinator;
use crate::recommend::merge::{self, RankedRecommendation};
use crate::recommend::metrics::{elapsed_ms, IngestMetrics, RequestMetrics};
use crate::vector_store::CollectionError;

#[derive(Debug, Error)]
pub enum EngineError {
    /// No cached embedding exists for this user; the ingest path has to run
    /// before recommendations can be served.
    #[error("no cached embedding for user `{0}`")]
    EmbeddingNotResolved(String),

    #[error("embedding provider error: {0}")]
    Provider(#[from] EmbeddingError),

    #[error("embedding cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("vector query error: {0}")]
    Query(#[from] CollectionError),

    /// The cached vector predates a dimension change and cannot be compared
    /// against the collections. Re-ingesting the profile repairs it.
    #[error("cached embedding is {actual}-dimensional, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Serialize)]
pub struct RecommendOutcome {
    pub recommendations: Vec<RankedRecommendation>,
    pub metrics: RequestMetrics,
}

#[derive(Debug, Serialize)]
pub struct IngestOutcome {
    pub dimension: usize,
    pub metrics: IngestMetrics,
}

pub struct RecommendationEngine {
    cache: Arc<dyn EmbeddingCache>,
    provider: Arc<dyn EmbeddingProvider>,
    fanout: FanOutCoordinator,
    expected_dim: usize,
}

impl RecommendationEngine {
    pub fn new(
        cache: Arc<dyn EmbeddingCache>,
        provider: Arc<dyn EmbeddingProvider>,
        fanout: FanOutCoordinator,
        expected_dim: usize,
    ) -> Self {
        Self {
            cache,
            provider,
            fanout,
            expected_dim,
        }
    }

    /// Serves one recommendation request: resolve the profile embedding
    /// from the cache, embed the search query when one is present, fan out
    /// the collection queries, rank, and report stage timings.
    ///
    /// A blank or whitespace-only `search_text` counts as absent.
    pub async fn recommend(
        &self,
        user_id: &str,
        search_text: Option<&str>,
    ) -> Result<RecommendOutcome, EngineError> {
        let started = Instant::now();

        let resolve_started = Instant::now();
        let cached = self.cache.get(user_id).await?;
        let embedding_resolution_ms = elapsed_ms(resolve_started);

        let cached = match cached {
            Some(cached) => cached,
            None => return Err(EngineError::EmbeddingNotResolved(user_id.to_string())),
        };
        if cached.vector.dim() != self.expected_dim {
            return Err(EngineError::DimensionMismatch {
                expected: self.expected_dim,
                actual: cached.vector.dim(),
            });
        }

        let search_text = search_text.map(str::trim).filter(|s| !s.is_empty());
        let (search_embedding, search_embedding_ms) = match search_text {
            None => (None, None),
            Some(text) => {
                let embed_started = Instant::now();
                let vector = self.provider.embed(text, EmbedTask::RetrievalQuery).await?;
                (Some(vector), Some(elapsed_ms(embed_started)))
            }
        };

        let query_started = Instant::now();
        let outcome = self
            .fanout
            .run(&cached.vector, search_embedding.as_ref())
            .await?;
        let query_ms = elapsed_ms(query_started);

        let merge_started = Instant::now();
        let recommendations = merge::rank(&outcome.descriptions, outcome.titles.as_deref());
        let merge_ms = elapsed_ms(merge_started);

        Ok(RecommendOutcome {
            recommendations,
            metrics: RequestMetrics {
                embedding_resolution_ms,
                search_embedding_ms,
                query_ms,
                merge_ms,
                total_ms: elapsed_ms(started),
                degraded_title_query: outcome.title_degraded,
            },
        })
    }

    /// Looks up the cached embedding for a user without touching the
    /// provider or the collections. `None` means the user has never been
    /// ingested.
    pub async fn cached_profile(
        &self,
        user_id: &str,
    ) -> Result<Option<CachedEmbedding>, EngineError> {
        Ok(self.cache.get(user_id).await?)
    }

    /// Embeds a profile text and stores it under the user's id, overwriting
    /// any previous entry. This is the only writer of cache entries.
    pub async fn ingest(
        &self,
        user_id: &str,
        profile_text: &str,
    ) -> Result<IngestOutcome, EngineError> {
        let started = Instant::now();

        let embed_started = Instant::now();
        let vector = self
            .provider
            .embed(profile_text, EmbedTask::RetrievalQuery)
            .await?;
        let embedding_ms = elapsed_ms(embed_started);

        let dimension = vector.dim();
        let entry = CachedEmbedding {
            vector,
            model: self.provider.model().to_string(),
            cached_at: Utc::now(),
        };

        // The write runs on its own task so it still lands if the caller
        // disconnects while we wait on it.
        let write_started = Instant::now();
        let cache = Arc::clone(&self.cache);
        let user = user_id.to_string();
        tokio::spawn(async move { cache.put(&user, &entry).await })
            .await
            .map_err(|e| EngineError::Cache(CacheError::Write(e.into())))??;
        let cache_write_ms = elapsed_ms(write_started);

        Ok(IngestOutcome {
            dimension,
            metrics: IngestMetrics {
                embedding_ms,
                cache_write_ms,
                total_ms: elapsed_ms(started),
            },
        })
    }
}
