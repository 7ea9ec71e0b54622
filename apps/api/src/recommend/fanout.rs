//! Query Fan-Out Coordinator — runs the per-request collection queries
//! concurrently and decides which failures abort the request.
//!
//! The description query is the backbone of every recommendation; if it
//! fails the request fails. The title query exists only when the caller
//! supplied a search query, and its failure degrades the request to
//! description-only scoring instead of killing it. Callers can see that
//! happened via `title_degraded`.

use std::sync::Arc;

use crate::embedding_client::EmbeddingVector;
use crate::vector_store::{CandidateRecord, CollectionError, CollectionSearch, JobCollection};

/// Collections hold at most a few thousand postings, so every candidate is
/// pulled and ranked locally rather than trusting store-side top-k cutoffs.
pub const DEFAULT_QUERY_LIMIT: usize = 10_000;

#[derive(Debug)]
pub struct FanOutOutcome {
    pub descriptions: Vec<CandidateRecord>,
    /// `None` when no title query was requested, and also when a requested
    /// one failed — `title_degraded` tells the two apart.
    pub titles: Option<Vec<CandidateRecord>>,
    pub title_degraded: bool,
}

pub struct FanOutCoordinator {
    store: Arc<dyn CollectionSearch>,
    limit: usize,
}

impl FanOutCoordinator {
    pub fn new(store: Arc<dyn CollectionSearch>, limit: usize) -> Self {
        Self { store, limit }
    }

    /// Issues the description query (always) and the title query (when a
    /// search embedding is present) concurrently, each against its own
    /// collection. No title query is issued at all when `search` is absent.
    pub async fn run(
        &self,
        profile: &EmbeddingVector,
        search: Option<&EmbeddingVector>,
    ) -> Result<FanOutOutcome, CollectionError> {
        let descriptions = self
            .store
            .query(JobCollection::Descriptions, profile, self.limit);

        match search {
            None => Ok(FanOutOutcome {
                descriptions: descriptions.await?,
                titles: None,
                title_degraded: false,
            }),
            Some(search) => {
                let titles = self.store.query(JobCollection::Titles, search, self.limit);
                let (descriptions, titles) = tokio::join!(descriptions, titles);

                let (titles, title_degraded) = match titles {
                    Ok(hits) => (Some(hits), false),
                    Err(e) => {
                        tracing::warn!(
                            "Title query failed, continuing with description-only scoring: {e}"
                        );
                        (None, true)
                    }
                };

                Ok(FanOutOutcome {
                    descriptions: descriptions?,
                    titles,
                    title_degraded,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubStore {
        calls: Mutex<Vec<(JobCollection, f32, usize)>>,
        fail_descriptions: bool,
        fail_titles: bool,
    }

    impl StubStore {
        fn new(fail_descriptions: bool, fail_titles: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                fail_descriptions,
                fail_titles,
            })
        }

        fn calls(&self) -> Vec<(JobCollection, f32, usize)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CollectionSearch for StubStore {
        async fn query(
            &self,
            collection: JobCollection,
            vector: &EmbeddingVector,
            limit: usize,
        ) -> Result<Vec<CandidateRecord>, CollectionError> {
            self.calls
                .lock()
                .unwrap()
                .push((collection, vector.as_slice()[0], limit));

            let fail = match collection {
                JobCollection::Descriptions => self.fail_descriptions,
                JobCollection::Titles => self.fail_titles,
            };
            if fail {
                return Err(CollectionError::Malformed("stub outage".to_string()));
            }

            let id = match collection {
                JobCollection::Descriptions => "desc-hit",
                JobCollection::Titles => "title-hit",
            };
            Ok(vec![CandidateRecord {
                id: id.to_string(),
                distance: 0.5,
                source: collection,
                document: None,
            }])
        }
    }

    fn profile() -> EmbeddingVector {
        EmbeddingVector::new(vec![1.0, 0.0])
    }

    fn search() -> EmbeddingVector {
        EmbeddingVector::new(vec![2.0, 0.0])
    }

    #[tokio::test]
    async fn test_no_title_query_without_search_embedding() {
        let store = StubStore::new(false, false);
        let coordinator = FanOutCoordinator::new(store.clone(), DEFAULT_QUERY_LIMIT);

        let outcome = coordinator.run(&profile(), None).await.unwrap();

        assert_eq!(store.calls().len(), 1);
        assert_eq!(store.calls()[0].0, JobCollection::Descriptions);
        assert!(outcome.titles.is_none());
        assert!(!outcome.title_degraded);
        assert_eq!(outcome.descriptions.len(), 1);
    }

    #[tokio::test]
    async fn test_each_embedding_routes_to_its_own_collection() {
        let store = StubStore::new(false, false);
        let coordinator = FanOutCoordinator::new(store.clone(), DEFAULT_QUERY_LIMIT);

        let outcome = coordinator.run(&profile(), Some(&search())).await.unwrap();

        let calls = store.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.contains(&(JobCollection::Descriptions, 1.0, DEFAULT_QUERY_LIMIT)));
        assert!(calls.contains(&(JobCollection::Titles, 2.0, DEFAULT_QUERY_LIMIT)));
        assert_eq!(outcome.titles.unwrap()[0].id, "title-hit");
        assert!(!outcome.title_degraded);
    }

    #[tokio::test]
    async fn test_title_failure_degrades_instead_of_failing() {
        let store = StubStore::new(false, true);
        let coordinator = FanOutCoordinator::new(store, DEFAULT_QUERY_LIMIT);

        let outcome = coordinator.run(&profile(), Some(&search())).await.unwrap();

        assert!(outcome.titles.is_none());
        assert!(outcome.title_degraded);
        assert_eq!(outcome.descriptions.len(), 1);
    }

    #[tokio::test]
    async fn test_description_failure_is_fatal() {
        let store = StubStore::new(true, false);
        let coordinator = FanOutCoordinator::new(store, DEFAULT_QUERY_LIMIT);

        assert!(coordinator.run(&profile(), None).await.is_err());
        assert!(coordinator.run(&profile(), Some(&search())).await.is_err());
    }

    #[tokio::test]
    async fn test_limit_is_forwarded_to_every_query() {
        let store = StubStore::new(false, false);
        let coordinator = FanOutCoordinator::new(store.clone(), 7);

        coordinator.run(&profile(), Some(&search())).await.unwrap();

        for (_, _, limit) in store.calls() {
            assert_eq!(limit, 7);
        }
    }
}
