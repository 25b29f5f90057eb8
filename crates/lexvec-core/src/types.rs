//! Domain types shared by the lexical index, the dense retrievers and the
//! fusion layer.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// An immutable unit of retrievable text.
///
/// - `id`: identifier assigned at ingestion time, when the store has one
/// - `content`: the text payload
/// - `section`: citation label of the originating provision (e.g. `§ 164`)
/// - `page`: page of the source document the chunk starts on
/// - `source`: corpus identifier
/// - `chunk_index`/`total_chunks`: position within the originating section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    #[serde(default)]
    pub id: Option<ChunkId>,
    pub content: String,
    #[serde(default = "unknown_section")]
    pub section: String,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub chunk_index: usize,
    #[serde(default = "one")]
    pub total_chunks: usize,
}

fn unknown_section() -> String {
    Chunk::UNKNOWN_SECTION.to_string()
}

fn one() -> usize {
    1
}

impl Chunk {
    pub const UNKNOWN_SECTION: &'static str = "Unknown";

    pub fn new(content: impl Into<String>, section: impl Into<String>, page: u32) -> Self {
        Self {
            id: None,
            content: content.into(),
            section: section.into(),
            page,
            source: String::new(),
            chunk_index: 0,
            total_chunks: 1,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<ChunkId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// First `chars` characters of the content, used as a dedup surrogate.
    pub fn content_prefix(&self, chars: usize) -> &str {
        match self.content.char_indices().nth(chars) {
            Some((idx, _)) => &self.content[..idx],
            None => &self.content,
        }
    }
}

/// Which retrieval method produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Vector,
    Text,
}

/// One row returned by a dense retriever. Lower `distance` is closer.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatch {
    pub chunk: Chunk,
    pub distance: f32,
}

impl DenseMatch {
    /// Similarity in `(0, 1]`: `1 / (1 + distance)`. `None` unless the
    /// distance is finite and non-negative.
    pub fn similarity(&self) -> Option<f32> {
        (self.distance.is_finite() && self.distance >= 0.0).then(|| 1.0 / (1.0 + self.distance))
    }
}

/// A chunk plus the raw score one retrieval method gave it.
///
/// `normalized_score` is filled in by the score normalizer; higher is always
/// better for both fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredResult {
    pub chunk: Chunk,
    pub score: f32,
    pub normalized_score: Option<f32>,
    pub source: SourceKind,
}

impl ScoredResult {
    pub fn new(chunk: Chunk, score: f32, source: SourceKind) -> Self {
        Self { chunk, score, normalized_score: None, source }
    }

    /// The normalized score when present, the raw score otherwise.
    pub fn effective_score(&self) -> f32 {
        self.normalized_score.unwrap_or(self.score)
    }
}

impl TryFrom<DenseMatch> for ScoredResult {
    type Error = anyhow::Error;

    fn try_from(m: DenseMatch) -> anyhow::Result<Self> {
        let score = m
            .similarity()
            .ok_or_else(|| anyhow::anyhow!("dense retriever returned distance {} for chunk in {}", m.distance, m.chunk.section))?;
        Ok(Self::new(m.chunk, score, SourceKind::Vector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_prefix_counts_characters_not_bytes() {
        let chunk = Chunk::new("§§§abc", "§ 1", 1);
        assert_eq!(chunk.content_prefix(2), "§§");
        assert_eq!(chunk.content_prefix(100), "§§§abc");
    }

    #[test]
    fn distance_maps_to_unit_similarity() {
        let m = DenseMatch { chunk: Chunk::new("x", "s", 1), distance: 0.0 };
        assert_eq!(m.similarity(), Some(1.0));
        let far = DenseMatch { distance: 3.0, ..m };
        assert!((far.similarity().unwrap() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn malformed_distances_are_rejected() {
        for distance in [f32::NAN, -5.0, f32::INFINITY] {
            let m = DenseMatch { chunk: Chunk::new("x", "§ 9", 1), distance };
            assert_eq!(m.similarity(), None, "distance {distance}");
            let err = ScoredResult::try_from(m).unwrap_err();
            assert!(err.to_string().contains("§ 9"), "{err}");
        }
    }

    #[test]
    fn chunk_metadata_defaults_when_missing() {
        let chunk: Chunk = serde_json::from_str(r#"{"content":"hello"}"#).unwrap();
        assert_eq!(chunk.section, "Unknown");
        assert_eq!(chunk.page, 0);
        assert_eq!(chunk.total_chunks, 1);
        assert!(chunk.id.is_none());
    }
}
