use anyhow::{anyhow, Context, Result};
use arrow_array::RecordBatch;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::Table;

use lexvec_core::traits::{DenseRetriever, Embedder};
use lexvec_core::types::{Chunk, DenseMatch};

use crate::table::{chunks_from_batch, distances_from_batch, open_db};

/// Dense retriever over a LanceDB chunk table.
///
/// LanceDB is async; this type owns a tokio runtime and blocks on it so it
/// can sit behind the synchronous [`DenseRetriever`] trait.
pub struct LanceRetriever {
	runtime: tokio::runtime::Runtime,
	table: Table,
	embedder: Box<dyn Embedder>,
}

impl LanceRetriever {
	pub fn open(uri: &str, table_name: &str, embedder: Box<dyn Embedder>) -> Result<Self> {
		let runtime = tokio::runtime::Runtime::new()?;
		let table = runtime
			.block_on(async {
				let db = open_db(uri).await?;
				Ok::<_, anyhow::Error>(db.open_table(table_name).execute().await?)
			})
			.with_context(|| format!("opening table '{}' at {}", table_name, uri))?;
		tracing::info!(uri, table = table_name, "lance retriever ready");
		Ok(Self { runtime, table, embedder })
	}

	fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
		let mut vectors = self.embedder.embed_batch(&[query.to_string()])?;
		let vector = vectors.pop().ok_or_else(|| anyhow!("embedder returned no vector"))?;
		if vector.len() != self.embedder.dim() {
			return Err(anyhow!("embedder returned {} dims, expected {}", vector.len(), self.embedder.dim()));
		}
		Ok(vector)
	}

	fn scan(&self) -> Result<Vec<Chunk>> {
		let batches: Vec<RecordBatch> = self.runtime.block_on(async {
			let total = self.table.count_rows(None).await?;
			if total == 0 {
				return Ok::<_, anyhow::Error>(Vec::new());
			}
			let stream = self.table.query().limit(total).execute().await?;
			Ok(stream.try_collect::<Vec<_>>().await?)
		})?;
		let mut chunks = Vec::new();
		for batch in &batches {
			chunks.extend(chunks_from_batch(batch)?);
		}
		Ok(chunks)
	}
}

impl DenseRetriever for LanceRetriever {
	fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<DenseMatch>> {
		if k == 0 {
			return Ok(Vec::new());
		}
		let vector = self.embed_query(query)?;
		let batches: Vec<RecordBatch> = self
			.runtime
			.block_on(async {
				let stream = self.table.vector_search(vector)?.limit(k).execute().await?;
				Ok::<_, anyhow::Error>(stream.try_collect::<Vec<_>>().await?)
			})
			.context("lance vector search")?;

		let mut matches = Vec::new();
		for batch in &batches {
			let chunks = chunks_from_batch(batch)?;
			let distances = distances_from_batch(batch)?;
			matches.extend(chunks.into_iter().zip(distances).map(|(chunk, distance)| DenseMatch { chunk, distance }));
		}
		matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
		matches.truncate(k);
		Ok(matches)
	}

	fn list_all(&self) -> Option<Result<Vec<Chunk>>> {
		Some(self.scan().context("scanning lance table"))
	}
}
