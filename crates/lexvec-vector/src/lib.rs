//! Dense retrievers for hybrid search.
//!
//! - [`LanceRetriever`]: LanceDB table of embedded chunks, supports full
//!   enumeration via a table scan
//! - [`InMemoryRetriever`]: brute-force retriever over a chunk list (JSONL
//!   corpora, tests)
//! - [`embed_provider`]: query/corpus embedders

pub mod embed_provider;
pub mod lance;
pub mod memory;
pub mod schema;
pub mod table;

pub use embed_provider::{default_embedder, HashedEmbedder};
pub use lance::LanceRetriever;
pub use memory::InMemoryRetriever;
