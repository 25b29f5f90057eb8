//! lexvec-text
//!
//! The lexical half of hybrid retrieval: an in-RAM tantivy index over the
//! chunk corpus, tokenized on Unicode whitespace and lower-cased.

pub mod analyzer;
pub mod index;

pub use index::LexicalIndex;
