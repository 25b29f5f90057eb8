use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Bm25StatisticsProvider, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::tokenizer::TextAnalyzer;
use tantivy::{doc, Index, IndexWriter, Searcher, TantivyDocument, Term};

use lexvec_core::types::{Chunk, ScoredResult, SourceKind};

use crate::analyzer::{build_analyzer, build_schema, register_analyzer, tokenize};

const WRITER_MEMORY_BYTES: usize = 50_000_000;

/// In-RAM tantivy index over a corpus snapshot, scored with tantivy's BM25
/// (`k1 = 1.2`, `b = 0.75`).
///
/// Built once and then shared read-only. Queries are analyzed with the same
/// analyzer as the corpus and turned into a disjunction of term queries, so
/// citation punctuation like `164(b)(6):` is matched literally and never
/// parsed as query syntax.
pub struct LexicalIndex {
	chunks: Vec<Chunk>,
	searcher: Searcher,
	pos_field: Field,
	content_field: Field,
	analyzer: TextAnalyzer,
	avg_doc_len: f32,
}

impl LexicalIndex {
	pub fn build(chunks: Vec<Chunk>) -> Result<Self> {
		let start = Instant::now();
		let (schema, pos_field, content_field) = build_schema();
		let index = Index::create_in_ram(schema);
		register_analyzer(&index);

		// One writer thread and one commit: a single segment whose doc ids follow corpus order.
		let mut writer: IndexWriter = index.writer_with_num_threads(1, WRITER_MEMORY_BYTES)?;
		for (pos, chunk) in chunks.iter().enumerate() {
			writer.add_document(doc!(pos_field => pos as u64, content_field => chunk.content.clone()))?;
		}
		writer.commit().context("committing lexical index")?;

		let searcher = index.reader()?.searcher();
		let docs = searcher.total_num_docs()?;
		let avg_doc_len = if docs == 0 { 0.0 } else { (searcher.total_num_tokens(content_field)? as f64 / docs as f64) as f32 };

		tracing::info!(
			chunks = chunks.len(),
			segments = searcher.segment_readers().len(),
			avg_doc_len,
			elapsed_ms = start.elapsed().as_millis() as u64,
			"lexical index built"
		);
		Ok(Self { chunks, searcher, pos_field, content_field, analyzer: build_analyzer(), avg_doc_len })
	}

	pub fn len(&self) -> usize {
		self.chunks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.chunks.is_empty()
	}

	pub fn avg_doc_len(&self) -> f32 {
		self.avg_doc_len
	}

	/// Chunks with a strictly positive score, best first, at most `k`.
	///
	/// Repeated query tokens count once per occurrence. Equal scores fall back
	/// to doc-id order, which is corpus order.
	pub fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredResult>> {
		if k == 0 || self.chunks.is_empty() {
			return Ok(Vec::new());
		}
		let mut analyzer = self.analyzer.clone();
		let clauses: Vec<(Occur, Box<dyn Query>)> = tokenize(&mut analyzer, query)
			.into_iter()
			.map(|token| {
				let term = Term::from_field_text(self.content_field, &token);
				(Occur::Should, Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)) as Box<dyn Query>)
			})
			.collect();
		if clauses.is_empty() {
			return Ok(Vec::new());
		}

		let top_docs = self.searcher.search(&BooleanQuery::new(clauses), &TopDocs::with_limit(k))?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			if score <= 0.0 {
				continue;
			}
			let doc: TantivyDocument = self.searcher.doc(addr)?;
			let pos = doc
				.get_first(self.pos_field)
				.and_then(|v| v.as_u64())
				.ok_or_else(|| anyhow!("lexical hit without a corpus position"))?;
			let chunk = self
				.chunks
				.get(pos as usize)
				.ok_or_else(|| anyhow!("lexical hit position {pos} outside corpus of {}", self.chunks.len()))?;
			hits.push(ScoredResult::new(chunk.clone(), score, SourceKind::Text));
		}
		tracing::debug!(query, hits = hits.len(), "lexical search");
		Ok(hits)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn corpus(texts: &[&str]) -> Vec<Chunk> {
		texts.iter().enumerate().map(|(i, t)| Chunk::new(*t, format!("§ {i}"), i as u32 + 1)).collect()
	}

	fn build(texts: &[&str]) -> LexicalIndex {
		LexicalIndex::build(corpus(texts)).unwrap()
	}

	#[test]
	fn score_matches_bm25_by_hand() {
		let index = build(&["apple banana", "cherry date", "elder fig", "grape honeydew"]);
		let hits = index.search("apple", 10).unwrap();
		assert_eq!(hits.len(), 1);
		// tf = 1 and dl == avgdl, so the saturation factor cancels (k1 + 1).
		let idf = (1.0f32 + (4.0 - 1.0 + 0.5) / (1.0 + 0.5)).ln();
		assert!((hits[0].score - idf).abs() < 1e-4, "score={} idf={}", hits[0].score, idf);
		assert_eq!(hits[0].source, SourceKind::Text);
	}

	#[test]
	fn common_terms_still_score_positive() {
		let index = build(&["common a", "common b", "common c", "d e"]);
		let hits = index.search("common", 10).unwrap();
		assert_eq!(hits.len(), 3);
		assert!(hits.iter().all(|h| h.score > 0.0));
		assert!(hits.windows(2).all(|w| w[0].score == w[1].score));
	}

	#[test]
	fn query_is_case_insensitive() {
		let index = build(&["state and local tax", "income", "credit", "wages"]);
		let hits = index.search("STATE Local", 5).unwrap();
		assert_eq!(hits.len(), 1);
		assert_eq!(hits[0].chunk.section, "§ 0");
	}

	#[test]
	fn ties_keep_corpus_order_and_k_truncates() {
		let index = build(&["salt cap", "other words", "salt cap", "more text", "filler here", "salt cap", "seventh doc"]);
		let hits = index.search("salt", 2).unwrap();
		assert_eq!(hits.len(), 2);
		assert_eq!(hits[0].chunk.section, "§ 0");
		assert_eq!(hits[1].chunk.section, "§ 2");
		assert_eq!(hits[0].score, hits[1].score);
	}

	#[test]
	fn results_are_sorted_descending_and_positive() {
		let index = build(&["tax tax tax credit", "tax credit", "child care", "depreciation of property", "gross income"]);
		let hits = index.search("tax credit", 10).unwrap();
		assert_eq!(hits.len(), 2);
		assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
		assert!(hits.iter().all(|h| h.score > 0.0));
	}

	#[test]
	fn citation_punctuation_is_matched_literally() {
		let index = build(&["limitation under 164(b)(6): state taxes", "income from wages", "§\u{a0}164 taxes", "credit"]);
		let hits = index.search("164(b)(6): AND (", 5).unwrap();
		assert_eq!(hits.len(), 1);
		assert_eq!(hits[0].chunk.section, "§ 0");

		let hits = index.search("§ 164", 5).unwrap();
		assert_eq!(hits[0].chunk.section, "§ 2");
	}

	#[test]
	fn unknown_terms_and_empty_index_yield_nothing() {
		let index = build(&["alpha", "beta", "gamma"]);
		assert!(index.search("zeta", 5).unwrap().is_empty());
		assert!(index.search("", 5).unwrap().is_empty());
		assert!(index.search("alpha", 0).unwrap().is_empty());

		let empty = LexicalIndex::build(Vec::new()).unwrap();
		assert!(empty.is_empty());
		assert!(empty.search("alpha", 5).unwrap().is_empty());
		assert_eq!(empty.avg_doc_len(), 0.0);
	}

	#[test]
	fn average_length_counts_tokens() {
		let index = build(&["one two", "three", "four five six"]);
		assert_eq!(index.len(), 3);
		assert!((index.avg_doc_len() - 2.0).abs() < 1e-6);
	}
}
