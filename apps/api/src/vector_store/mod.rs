//! Vector store adapter — Chroma HTTP API client for the two job collections.
//!
//! The engine never talks to Chroma directly; it depends on the
//! `CollectionSearch` trait so tests and alternative backends can swap in
//! without touching the fan-out or orchestrator code.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::embedding_client::EmbeddingVector;

/// The two searchable job indexes. Names match the deployed Chroma
/// collections this service queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobCollection {
    Titles,
    Descriptions,
}

impl JobCollection {
    pub fn collection_name(self) -> &'static str {
        match self {
            JobCollection::Titles => "job_titles_documents",
            JobCollection::Descriptions => "job_desc_req_documents",
        }
    }
}

/// One nearest-neighbor hit: job identifier, raw distance (lower = more
/// similar) and the collection that produced it. The stored source document
/// rides along for observability but plays no part in scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: String,
    pub distance: f64,
    pub source: JobCollection,
    pub document: Option<String>,
}

#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed query response: {0}")]
    Malformed(String),
}

/// Nearest-neighbor query seam. Carried as `Arc<dyn CollectionSearch>` by
/// the fan-out coordinator.
#[async_trait]
pub trait CollectionSearch: Send + Sync {
    async fn query(
        &self,
        collection: JobCollection,
        vector: &EmbeddingVector,
        limit: usize,
    ) -> Result<Vec<CandidateRecord>, CollectionError>;
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query_embeddings: Vec<&'a EmbeddingVector>,
    n_results: usize,
    include: Vec<&'static str>,
}

/// Chroma returns one inner array per query embedding; we always send
/// exactly one, so only the first row of each field is meaningful.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    distances: Option<Vec<Vec<f64>>>,
    documents: Option<Vec<Vec<Option<String>>>>,
}

#[derive(Debug, Deserialize)]
struct CollectionInfo {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Heartbeat {
    #[serde(rename = "nanosecond heartbeat")]
    nanosecond_heartbeat: u64,
}

/// HTTP client for a Chroma server holding both job collections.
///
/// Collection names are resolved to ids lazily and memoized: collections may
/// be created by the ingestion pipeline after this service boots, so a
/// missing collection at startup is not fatal.
pub struct ChromaClient {
    client: Client,
    base_url: String,
    collection_ids: RwLock<HashMap<&'static str, String>>,
}

impl ChromaClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            collection_ids: RwLock::new(HashMap::new()),
        }
    }

    /// GET /api/v1/heartbeat — returns the server's nanosecond timestamp.
    pub async fn heartbeat(&self) -> Result<u64, CollectionError> {
        let url = format!("{}/api/v1/heartbeat", self.base_url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CollectionError::Api {
                status: status.as_u16(),
                message,
            });
        }
        let heartbeat: Heartbeat = response.json().await?;
        Ok(heartbeat.nanosecond_heartbeat)
    }

    /// Resolves a collection name to its id, memoizing the result.
    async fn collection_id(&self, collection: JobCollection) -> Result<String, CollectionError> {
        let name = collection.collection_name();
        if let Some(id) = self.collection_ids.read().await.get(name) {
            return Ok(id.clone());
        }

        let url = format!("{}/api/v1/collections/{}", self.base_url, name);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CollectionError::Api {
                status: status.as_u16(),
                message,
            });
        }
        let info: CollectionInfo = response.json().await?;

        info!("Resolved Chroma collection '{}' -> {}", name, info.id);
        self.collection_ids
            .write()
            .await
            .insert(name, info.id.clone());
        Ok(info.id)
    }
}

#[async_trait]
impl CollectionSearch for ChromaClient {
    async fn query(
        &self,
        collection: JobCollection,
        vector: &EmbeddingVector,
        limit: usize,
    ) -> Result<Vec<CandidateRecord>, CollectionError> {
        let id = self.collection_id(collection).await?;
        let url = format!("{}/api/v1/collections/{}/query", self.base_url, id);

        let body = QueryRequest {
            query_embeddings: vec![vector],
            n_results: limit,
            include: vec!["documents", "distances"],
        };

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CollectionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: QueryResponse = response.json().await?;
        let records = first_batch(parsed, collection)?;

        debug!(
            "Collection '{}' query returned {} hits",
            collection.collection_name(),
            records.len()
        );
        Ok(records)
    }
}

/// Flattens the first (and only) batch row of a Chroma query response into
/// candidate records, preserving the ascending-distance order the server
/// returned.
fn first_batch(
    response: QueryResponse,
    source: JobCollection,
) -> Result<Vec<CandidateRecord>, CollectionError> {
    let ids = match response.ids.into_iter().next() {
        Some(ids) if !ids.is_empty() => ids,
        _ => return Ok(Vec::new()),
    };

    let distances = response
        .distances
        .and_then(|d| d.into_iter().next())
        .ok_or_else(|| CollectionError::Malformed("missing distances".to_string()))?;
    if distances.len() != ids.len() {
        return Err(CollectionError::Malformed(format!(
            "{} ids but {} distances",
            ids.len(),
            distances.len()
        )));
    }

    let mut documents = response
        .documents
        .and_then(|d| d.into_iter().next())
        .unwrap_or_default();
    documents.resize(ids.len(), None);

    Ok(ids
        .into_iter()
        .zip(distances)
        .zip(documents)
        .map(|((id, distance), document)| CandidateRecord {
            id,
            distance,
            source,
            document,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> QueryResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_first_batch_flattens_parallel_arrays() {
        let resp = response(
            r#"{
                "ids": [["a", "b"]],
                "distances": [[0.1, 0.5]],
                "documents": [["Senior Rust Engineer", null]]
            }"#,
        );
        let records = first_batch(resp, JobCollection::Titles).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "a");
        assert_eq!(records[0].distance, 0.1);
        assert_eq!(records[0].source, JobCollection::Titles);
        assert_eq!(
            records[0].document.as_deref(),
            Some("Senior Rust Engineer")
        );
        assert!(records[1].document.is_none());
    }

    #[test]
    fn test_first_batch_empty_ids_yields_no_records() {
        let resp = response(r#"{"ids": [[]], "distances": [[]], "documents": null}"#);
        assert!(first_batch(resp, JobCollection::Descriptions)
            .unwrap()
            .is_empty());

        let resp = response(r#"{"ids": [], "distances": null, "documents": null}"#);
        assert!(first_batch(resp, JobCollection::Descriptions)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_first_batch_missing_distances_is_malformed() {
        let resp = response(r#"{"ids": [["a"]], "distances": null, "documents": null}"#);
        let err = first_batch(resp, JobCollection::Titles).unwrap_err();
        assert!(matches!(err, CollectionError::Malformed(_)));
    }

    #[test]
    fn test_first_batch_length_mismatch_is_malformed() {
        let resp = response(r#"{"ids": [["a", "b"]], "distances": [[0.1]], "documents": null}"#);
        let err = first_batch(resp, JobCollection::Titles).unwrap_err();
        assert!(matches!(err, CollectionError::Malformed(_)));
    }

    #[test]
    fn test_first_batch_pads_missing_documents() {
        let resp = response(r#"{"ids": [["a", "b"]], "distances": [[0.1, 0.2]], "documents": [["only one"]]}"#);
        let records = first_batch(resp, JobCollection::Descriptions).unwrap();
        assert_eq!(records[0].document.as_deref(), Some("only one"));
        assert!(records[1].document.is_none());
    }

    #[test]
    fn test_heartbeat_response_parses_spaced_key() {
        let hb: Heartbeat =
            serde_json::from_str(r#"{"nanosecond heartbeat": 1716400000000000000}"#).unwrap();
        assert_eq!(hb.nanosecond_heartbeat, 1_716_400_000_000_000_000);
    }

    #[test]
    fn test_collection_names_match_deployment() {
        assert_eq!(
            JobCollection::Titles.collection_name(),
            "job_titles_documents"
        );
        assert_eq!(
            JobCollection::Descriptions.collection_name(),
            "job_desc_req_documents"
        );
    }
}
