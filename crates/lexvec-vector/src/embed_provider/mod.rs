//! Embedding providers used by the dense retrievers.
//!
//! Model inference lives outside this workspace; the providers here must
//! return L2-normalized vectors of a fixed dimensionality so distances from
//! different queries stay comparable.

use lexvec_core::config::EmbeddingSettings;
use lexvec_core::traits::Embedder;

pub mod hashed;

pub use hashed::HashedEmbedder;

pub fn default_embedder(settings: &EmbeddingSettings) -> Box<dyn Embedder> {
    tracing::info!(dim = settings.dim, "using hashed embedder");
    Box::new(HashedEmbedder::new(settings.dim))
}
