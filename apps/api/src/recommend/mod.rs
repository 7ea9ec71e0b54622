// Recommendation engine: cached profile embeddings fanned out against the
// title and description collections, merged into one ranked list.
// All provider calls go through embedding_client — no direct Gemini calls here.

pub mod cache;
pub mod engine;
pub mod fanout;
pub mod handlers;
pub mod merge;
pub mod metrics;
