#![allow(dead_code)]

/// Embedding Client — the single point of entry for all embedding calls in Hireon.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini embedding API directly.
/// All embedding generation MUST go through this module.
///
/// Model: text-multilingual-embedding-002 (hardcoded — do not make configurable
/// to prevent drift between cached vectors and query vectors)
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// The embedding model used for all vector generation in Hireon.
/// Every vector in the cache and both job collections must come from this
/// model; mixing models silently breaks distance comparisons.
pub const EMBEDDING_MODEL: &str = "text-multilingual-embedding-002";
const MAX_RETRIES: u32 = 3;

/// A fixed-dimensionality embedding vector as produced by the provider.
///
/// Serializes as a bare float array so it can be stored in the cache and
/// shipped to the vector store without wrapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

/// Task hint forwarded to the provider. Retrieval queries and indexed
/// documents are embedded asymmetrically by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedTask {
    RetrievalQuery,
    RetrievalDocument,
    SemanticSimilarity,
}

impl EmbedTask {
    pub fn as_str(self) -> &'static str {
        match self {
            EmbedTask::RetrievalQuery => "RETRIEVAL_QUERY",
            EmbedTask::RetrievalDocument => "RETRIEVAL_DOCUMENT",
            EmbedTask::SemanticSimilarity => "SEMANTIC_SIMILARITY",
        }
    }
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("provider returned an empty embedding")]
    EmptyEmbedding,

    #[error("provider returned a {actual}-dimensional vector, expected {expected}")]
    Dimension { expected: usize, actual: usize },

    #[error("rate limited after {retries} retries")]
    RateLimited { retries: u32 },
}

/// The seam the orchestrator depends on. Swapping providers (or stubbing
/// one in tests) must not touch any caller code.
///
/// Carried as `Arc<dyn EmbeddingProvider>`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str, task: EmbedTask) -> Result<EmbeddingVector, EmbeddingError>;

    /// Model identifier recorded next to every vector this provider
    /// produces. Vectors from different models must never be compared.
    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: Option<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// The single embedding client used by all services in Hireon.
/// Wraps the Gemini embedContent API with retry logic and a dimensionality
/// check against the configured vector width.
#[derive(Clone)]
pub struct GeminiEmbeddingClient {
    client: Client,
    api_key: String,
    expected_dim: usize,
}

impl GeminiEmbeddingClient {
    pub fn new(api_key: String, expected_dim: usize) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            expected_dim,
        }
    }

    /// Makes a raw embedContent call, returning the embedding vector.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(
        &self,
        text: &str,
        task: EmbedTask,
    ) -> Result<EmbeddingVector, EmbeddingError> {
        let url = format!("{GEMINI_API_URL}/models/{EMBEDDING_MODEL}:embedContent");
        let request_body = EmbedContentRequest {
            content: Content {
                parts: vec![Part { text }],
            },
            task_type: task.as_str(),
        };

        let mut last_error: Option<EmbeddingError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Embedding call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(EmbeddingError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Embedding API returned {}: {}", status, body);
                last_error = Some(EmbeddingError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                // Try to parse a structured error message
                let message = serde_json::from_str::<GeminiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(EmbeddingError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let parsed: EmbedContentResponse = response.json().await?;
            let values = parsed
                .embedding
                .map(|e| e.values)
                .filter(|v| !v.is_empty())
                .ok_or(EmbeddingError::EmptyEmbedding)?;

            if values.len() != self.expected_dim {
                // Never retried: a wrong-width vector means the model and the
                // configured dimensionality disagree, and every comparison
                // made with it would be invalid.
                return Err(EmbeddingError::Dimension {
                    expected: self.expected_dim,
                    actual: values.len(),
                });
            }

            debug!(
                "Embedding call succeeded: task={}, dim={}",
                task.as_str(),
                values.len()
            );

            return Ok(EmbeddingVector::new(values));
        }

        Err(last_error.unwrap_or(EmbeddingError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingClient {
    async fn embed(&self, text: &str, task: EmbedTask) -> Result<EmbeddingVector, EmbeddingError> {
        self.call(text, task).await
    }

    fn model(&self) -> &str {
        EMBEDDING_MODEL
    }
}
