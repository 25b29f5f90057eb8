//! Hybrid retrieval: dense similarity and BM25 results normalized per
//! method, blended with a weight `alpha`, and rewarded when both methods
//! agree.
//!
//! [`HybridSearchEngine`] is the only entry point callers need; the
//! building blocks are public for front ends that want finer control.

pub mod engine;
pub mod fusion;
pub mod normalize;
pub mod request;
pub mod weighting;

pub use engine::HybridSearchEngine;
pub use fusion::{fuse, FusedResult, FusionParams};
pub use normalize::normalize;
pub use request::{example_queries, format_text, SearchHitView, SearchRequest, SearchResponse};
pub use weighting::AlphaSelector;
