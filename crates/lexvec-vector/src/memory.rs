use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};

use lexvec_core::traits::{DenseRetriever, Embedder};
use lexvec_core::types::{Chunk, DenseMatch};

/// Brute-force dense retriever over an in-memory chunk list.
///
/// Distances are Euclidean between L2-normalized embeddings; equal
/// distances keep corpus order.
pub struct InMemoryRetriever {
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
    embedder: Box<dyn Embedder>,
}

impl InMemoryRetriever {
    pub fn new(chunks: Vec<Chunk>, embedder: Box<dyn Embedder>) -> Result<Self> {
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = embedder.embed_batch(&texts)?;
        if vectors.len() != chunks.len() {
            return Err(anyhow!("embedder returned {} vectors for {} chunks", vectors.len(), chunks.len()));
        }
        Ok(Self { chunks, vectors, embedder })
    }

    /// Reads one JSON chunk per line; blank lines are skipped.
    pub fn from_jsonl(path: &Path, embedder: Box<dyn Embedder>) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| format!("reading corpus {}", path.display()))?;
        let mut chunks = Vec::new();
        for (lineno, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let chunk: Chunk = serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid chunk", path.display(), lineno + 1))?;
            chunks.push(chunk);
        }
        tracing::info!(path = %path.display(), chunks = chunks.len(), "loaded corpus");
        Self::new(chunks, embedder)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt()
}

impl DenseRetriever for InMemoryRetriever {
    fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<DenseMatch>> {
        let q = self
            .embedder
            .embed_batch(&[query.to_string()])?
            .pop()
            .ok_or_else(|| anyhow!("embedder returned no vector"))?;
        let mut ranked: Vec<(usize, f32)> = self.vectors.iter().map(|v| euclidean(&q, v)).enumerate().collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        ranked.truncate(k);
        Ok(ranked
            .into_iter()
            .map(|(i, distance)| DenseMatch { chunk: self.chunks[i].clone(), distance })
            .collect())
    }

    fn list_all(&self) -> Option<Result<Vec<Chunk>>> {
        Some(Ok(self.chunks.clone()))
    }
}
