//! Embedding Cache — durable storage for user-profile embeddings, keyed by
//! user id.
//!
//! The cache is the only source a recommendation request reads embeddings
//! from. A miss here is not an error at this layer: `get` reports absence
//! as `Ok(None)` and the orchestrator decides what a missing embedding
//! means for the request. Writes overwrite unconditionally; the newest
//! profile wins.
//!
//! Entries never expire in the base design. A TTL would go on the write
//! side (`SET` with an expiry) without touching this read/write contract.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::embedding_client::EmbeddingVector;

const KEY_PREFIX: &str = "cv:embedding:";

#[derive(Debug, Error)]
pub enum CacheError {
    /// Loading or decoding a stored embedding failed. Covers transport
    /// failures and corrupt payloads alike; a miss is not a read error.
    #[error("embedding cache read failed: {0}")]
    Read(#[source] anyhow::Error),

    /// Storing an embedding failed. The entry must be assumed absent.
    #[error("embedding cache write failed: {0}")]
    Write(#[source] anyhow::Error),
}

/// A stored profile embedding plus the provenance needed to audit it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedEmbedding {
    pub vector: EmbeddingVector,
    /// Provider model that produced the vector. Vectors from different
    /// models are not comparable, so the model name travels with the data.
    pub model: String,
    pub cached_at: DateTime<Utc>,
}

#[async_trait]
pub trait EmbeddingCache: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<CachedEmbedding>, CacheError>;
    async fn put(&self, user_id: &str, entry: &CachedEmbedding) -> Result<(), CacheError>;
}

fn cache_key(user_id: &str) -> String {
    format!("{KEY_PREFIX}{user_id}")
}

/// Redis-backed cache. Entries are stored as JSON strings under a
/// `cv:embedding:` namespace so they coexist with other keyspaces on a
/// shared instance.
pub struct RedisEmbeddingCache {
    client: redis::Client,
}

impl RedisEmbeddingCache {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmbeddingCache for RedisEmbeddingCache {
    async fn get(&self, user_id: &str) -> Result<Option<CachedEmbedding>, CacheError> {
        let mut con = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Read(e.into()))?;

        let raw: Option<String> = con
            .get(cache_key(user_id))
            .await
            .map_err(|e| CacheError::Read(e.into()))?;

        match raw {
            None => Ok(None),
            Some(raw) => {
                let entry = serde_json::from_str::<CachedEmbedding>(&raw)
                    .with_context(|| {
                        format!("cached embedding for `{user_id}` is not valid JSON")
                    })
                    .map_err(CacheError::Read)?;
                Ok(Some(entry))
            }
        }
    }

    async fn put(&self, user_id: &str, entry: &CachedEmbedding) -> Result<(), CacheError> {
        let payload = serde_json::to_string(entry).map_err(|e| CacheError::Write(e.into()))?;

        let mut con = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Write(e.into()))?;

        con.set::<_, _, ()>(cache_key(user_id), payload)
            .await
            .map_err(|e| CacheError::Write(e.into()))?;
        Ok(())
    }
}
