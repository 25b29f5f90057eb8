use crate::types::{Chunk, DenseMatch};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// The dense (embedding similarity) side of hybrid retrieval.
///
/// `similarity_search` is the bounded operation every store supports. Stores
/// that can enumerate their whole corpus advertise it by returning `Some`
/// from `list_all`; the lexical index is built from that snapshot when
/// available and from a large probe query otherwise.
pub trait DenseRetriever: Send + Sync {
    fn similarity_search(&self, query: &str, k: usize) -> anyhow::Result<Vec<DenseMatch>>;

    fn list_all(&self) -> Option<anyhow::Result<Vec<Chunk>>> {
        None
    }
}

impl<R: DenseRetriever + ?Sized> DenseRetriever for Box<R> {
    fn similarity_search(&self, query: &str, k: usize) -> anyhow::Result<Vec<DenseMatch>> {
        (**self).similarity_search(query, k)
    }

    fn list_all(&self) -> Option<anyhow::Result<Vec<Chunk>>> {
        (**self).list_all()
    }
}

impl<R: DenseRetriever + ?Sized> DenseRetriever for std::sync::Arc<R> {
    fn similarity_search(&self, query: &str, k: usize) -> anyhow::Result<Vec<DenseMatch>> {
        (**self).similarity_search(query, k)
    }

    fn list_all(&self) -> Option<anyhow::Result<Vec<Chunk>>> {
        (**self).list_all()
    }
}
