use std::collections::HashMap;

use lexvec_core::config::{FusionKey, SearchSettings};
use lexvec_core::types::{Chunk, ScoredResult, SourceKind};

/// Knobs for one fusion pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionParams {
    /// Weight of the semantic component; the lexical one gets `1 - alpha`.
    pub alpha: f32,
    pub consensus_boost: f32,
    pub key: FusionKey,
    pub key_prefix_chars: usize,
}

impl FusionParams {
    pub fn new(alpha: f32, settings: &SearchSettings) -> Self {
        Self {
            alpha,
            consensus_boost: settings.consensus_boost,
            key: settings.fusion_key,
            key_prefix_chars: settings.key_prefix_chars,
        }
    }
}

impl Default for FusionParams {
    fn default() -> Self {
        Self::new(0.5, &SearchSettings::default())
    }
}

/// A fused, ranked result. `score` is the clamped blended score.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedResult {
    pub chunk: Chunk,
    pub score: f32,
    pub semantic_component: f32,
    pub bm25_component: f32,
    pub sources: Vec<SourceKind>,
}

impl FusedResult {
    pub fn found_by_both(&self) -> bool {
        self.sources.len() > 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum EntryKey {
    Id(String),
    Prefix(String),
}

fn entry_key(chunk: &Chunk, params: &FusionParams) -> EntryKey {
    match (params.key, &chunk.id) {
        (FusionKey::ChunkId, Some(id)) => EntryKey::Id(id.clone()),
        _ => EntryKey::Prefix(chunk.content_prefix(params.key_prefix_chars).to_string()),
    }
}

struct FusionEntry {
    chunk: Chunk,
    semantic: f32,
    lexical: f32,
    sources: Vec<SourceKind>,
}

/// `alpha * semantic + (1 - alpha) * lexical`, times `consensus_boost` when
/// both methods found the item. Not clamped.
pub fn blended_score(semantic: f32, lexical: f32, both: bool, params: &FusionParams) -> f32 {
    let blended = params.alpha * semantic + (1.0 - params.alpha) * lexical;
    if both { blended * params.consensus_boost } else { blended }
}

/// Merges per-method result lists into the top `k` fused results.
///
/// Inputs should already be normalized; items missing from one method get
/// 0 for that component. The first chunk seen under a key represents it
/// (semantic list first), and a later hit from the same method under the
/// same key replaces that method's component. Ties keep first-seen order.
pub fn fuse(semantic: Vec<ScoredResult>, lexical: Vec<ScoredResult>, params: &FusionParams, k: usize) -> Vec<FusedResult> {
    let mut entries: Vec<FusionEntry> = Vec::with_capacity(semantic.len() + lexical.len());
    let mut by_key: HashMap<EntryKey, usize> = HashMap::new();

    for (kind, list) in [(SourceKind::Vector, semantic), (SourceKind::Text, lexical)] {
        for result in list {
            let component = result.effective_score();
            let key = entry_key(&result.chunk, params);
            let idx = *by_key.entry(key).or_insert_with(|| {
                entries.push(FusionEntry { chunk: result.chunk, semantic: 0.0, lexical: 0.0, sources: Vec::new() });
                entries.len() - 1
            });
            let entry = &mut entries[idx];
            match kind {
                SourceKind::Vector => entry.semantic = component,
                SourceKind::Text => entry.lexical = component,
            }
            if !entry.sources.contains(&kind) {
                entry.sources.push(kind);
            }
        }
    }

    let mut fused: Vec<FusedResult> = entries
        .into_iter()
        .map(|e| {
            let both = e.sources.len() > 1;
            let score = blended_score(e.semantic, e.lexical, both, params).clamp(0.0, 1.0);
            FusedResult { chunk: e.chunk, score, semantic_component: e.semantic, bm25_component: e.lexical, sources: e.sources }
        })
        .collect();
    fused.sort_by(|a, b| b.score.total_cmp(&a.score));
    fused.truncate(k);
    fused
}
