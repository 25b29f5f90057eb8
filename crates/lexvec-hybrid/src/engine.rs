use anyhow::Context;
use once_cell::sync::OnceCell;

use lexvec_core::config::{Config, LexicalSettings, SearchSettings};
use lexvec_core::error::{Error, Result};
use lexvec_core::traits::DenseRetriever;
use lexvec_core::types::{Chunk, ScoredResult};
use lexvec_text::LexicalIndex;

use crate::fusion::{fuse, FusedResult, FusionParams};
use crate::normalize::normalize;
use crate::request::{SearchRequest, SearchResponse};
use crate::weighting::AlphaSelector;

/// Entry point for hybrid retrieval.
///
/// Owns the dense retriever and the lexical index. The index is built from
/// a corpus snapshot on first use, exactly once: concurrent first queries
/// block behind a single build and a failed build is retried by the next
/// query. After that the index is only read, so the engine can be shared
/// (`Arc<HybridSearchEngine<_>>`) across threads without further locking.
pub struct HybridSearchEngine<R> {
    retriever: R,
    lexical: OnceCell<LexicalIndex>,
    settings: SearchSettings,
    lexical_settings: LexicalSettings,
    alpha: AlphaSelector,
}

impl<R: DenseRetriever> HybridSearchEngine<R> {
    pub fn new(retriever: R) -> Self {
        Self::with_settings(retriever, SearchSettings::default(), LexicalSettings::default())
    }

    pub fn with_settings(retriever: R, settings: SearchSettings, lexical_settings: LexicalSettings) -> Self {
        let alpha = AlphaSelector::from_settings(&settings);
        Self { retriever, lexical: OnceCell::new(), settings, lexical_settings, alpha }
    }

    pub fn from_config(retriever: R, config: &Config) -> Result<Self> {
        Ok(Self::with_settings(retriever, config.search()?, config.lexical()?))
    }

    pub fn retriever(&self) -> &R {
        &self.retriever
    }

    /// Whether the lexical index has been built.
    pub fn is_ready(&self) -> bool {
        self.lexical.get().is_some()
    }

    /// Builds the lexical index if needed and returns its size.
    pub fn warm_up(&self) -> Result<usize> {
        self.lexical_index().map(LexicalIndex::len).map_err(|e| Error::search(&e))
    }

    fn lexical_index(&self) -> anyhow::Result<&LexicalIndex> {
        self.lexical.get_or_try_init(|| {
            let chunks = self.corpus_snapshot().context("building lexical index")?;
            LexicalIndex::build(chunks).context("building lexical index")
        })
    }

    fn corpus_snapshot(&self) -> anyhow::Result<Vec<Chunk>> {
        if let Some(all) = self.retriever.list_all() {
            return all.context("enumerating corpus");
        }
        let s = &self.lexical_settings;
        tracing::warn!(probe_k = s.probe_k, "retriever cannot enumerate its corpus; using a probe query");
        let matches = match self.retriever.similarity_search(&s.probe_query, s.probe_k) {
            Ok(matches) => matches,
            Err(err) => {
                tracing::warn!(error = %err, fallback = %s.fallback_probe_query, "corpus probe failed; trying fallback probe");
                self.retriever
                    .similarity_search(&s.fallback_probe_query, s.fallback_probe_k)
                    .context("fallback corpus probe")?
            }
        };
        Ok(matches.into_iter().map(|m| m.chunk).collect())
    }

    /// Dense candidates scored `1 / (1 + distance)`. A NaN, infinite or
    /// negative distance is an error.
    pub fn semantic_search(&self, query: &str, k: usize) -> anyhow::Result<Vec<ScoredResult>> {
        self.retriever
            .similarity_search(query, k)?
            .into_iter()
            .map(ScoredResult::try_from)
            .collect()
    }

    /// Lexical candidates; empty until the index has been built.
    pub fn lexical_search(&self, query: &str, k: usize) -> anyhow::Result<Vec<ScoredResult>> {
        match self.lexical.get() {
            Some(index) => index.search(query, k),
            None => Ok(Vec::new()),
        }
    }

    /// Top `k` fused results for `query` with semantic weight `alpha`.
    pub fn search(&self, query: &str, k: usize, alpha: f32) -> Result<Vec<FusedResult>> {
        validate_query(query)?;
        if k == 0 {
            return Err(Error::InvalidInput("k must be positive".into()));
        }
        validate_alpha(alpha)?;
        self.run(query, k, alpha).map_err(|e| {
            tracing::error!(query, error = %format!("{e:#}"), "search failed");
            Error::search(&e)
        })
    }

    /// Like [`search`](Self::search) with `alpha` picked from the query text.
    /// Returns the alpha used alongside the results.
    pub fn search_auto(&self, query: &str, k: usize) -> Result<(f32, Vec<FusedResult>)> {
        let alpha = self.alpha.select(query);
        Ok((alpha, self.search(query, k, alpha)?))
    }

    /// Validates a front-end request, runs it and shapes the response.
    ///
    /// A request without `top_k` gets `search.default_top_k`.
    pub fn handle(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let top_k = request.validate(&self.settings)?;
        let alpha = request.alpha.unwrap_or_else(|| self.alpha.select(&request.query));
        let results = self.search(&request.query, top_k, alpha)?;
        Ok(SearchResponse::new(&request.query, alpha, results))
    }

    fn run(&self, query: &str, k: usize, alpha: f32) -> anyhow::Result<Vec<FusedResult>> {
        self.lexical_index()?;
        let pool = k.saturating_mul(self.settings.candidate_multiplier);
        let mut semantic = self.semantic_search(query, pool).context("dense retrieval")?;
        let mut lexical = self.lexical_search(query, pool).context("lexical retrieval")?;
        normalize(&mut semantic);
        normalize(&mut lexical);
        tracing::debug!(query, alpha, pool, semantic = semantic.len(), lexical = lexical.len(), "fusing candidates");
        Ok(fuse(semantic, lexical, &FusionParams::new(alpha, &self.settings), k))
    }
}

pub(crate) fn validate_query(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        return Err(Error::InvalidInput("query must not be empty".into()));
    }
    Ok(())
}

pub(crate) fn validate_alpha(alpha: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(Error::InvalidInput(format!("alpha must be in [0, 1], got {alpha}")));
    }
    Ok(())
}
