//! Per-request timing buckets reported alongside orchestrator responses.
//!
//! Timing is measured in the orchestrator around each external call; the
//! pure ranking code never touches a clock.

use std::time::Instant;

use serde::Serialize;

/// Stage timings for one recommendation request, in milliseconds.
#[derive(Debug, Clone, Serialize)]
pub struct RequestMetrics {
    /// Cache lookup that resolved the profile embedding.
    pub embedding_resolution_ms: f64,
    /// Provider call for the search-query embedding; `null` when the
    /// request carried no search query.
    pub search_embedding_ms: Option<f64>,
    /// Wall-clock across the concurrent collection queries.
    pub query_ms: f64,
    pub merge_ms: f64,
    pub total_ms: f64,
    /// True when the title query failed and scoring fell back to
    /// description-only.
    pub degraded_title_query: bool,
}

/// Stage timings for one profile ingest, in milliseconds.
#[derive(Debug, Clone, Serialize)]
pub struct IngestMetrics {
    pub embedding_ms: f64,
    pub cache_write_ms: f64,
    pub total_ms: f64,
}

pub(crate) fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_metrics_serialize_with_null_search_bucket() {
        let metrics = RequestMetrics {
            embedding_resolution_ms: 1.5,
            search_embedding_ms: None,
            query_ms: 20.0,
            merge_ms: 0.3,
            total_ms: 22.1,
            degraded_title_query: false,
        };
        let value = serde_json::to_value(&metrics).unwrap();
        assert_eq!(value["search_embedding_ms"], serde_json::Value::Null);
        assert_eq!(value["query_ms"], 20.0);
        assert!(!value["degraded_title_query"].as_bool().unwrap());
    }

    #[test]
    fn test_elapsed_ms_is_non_negative() {
        assert!(elapsed_ms(Instant::now()) >= 0.0);
    }
}
