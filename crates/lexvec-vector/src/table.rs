//! LanceDB connection helpers and decoding of chunk rows from record batches.

use anyhow::{anyhow, Result};
use arrow_array::{Array, Float32Array, Int32Array, RecordBatch, StringArray};
use lancedb::{connect, Connection};

use lexvec_core::types::Chunk;

use crate::schema::DISTANCE_COLUMN;

pub async fn open_db(uri: &str) -> Result<Connection> {
	Ok(connect(uri).execute().await?)
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Option<&'a StringArray> {
	batch.column_by_name(name).and_then(|c| c.as_any().downcast_ref::<StringArray>())
}

fn int_column<'a>(batch: &'a RecordBatch, name: &str) -> Option<&'a Int32Array> {
	batch.column_by_name(name).and_then(|c| c.as_any().downcast_ref::<Int32Array>())
}

fn opt_string(col: Option<&StringArray>, i: usize) -> Option<String> {
	col.filter(|c| !c.is_null(i)).map(|c| c.value(i).to_string())
}

fn opt_int(col: Option<&Int32Array>, i: usize) -> Option<i32> {
	col.filter(|c| !c.is_null(i)).map(|c| c.value(i))
}

/// Decodes every row of `batch` into a [`Chunk`].
///
/// `content` is required; missing metadata falls back to section
/// `"Unknown"`, page 0 and an empty source.
pub fn chunks_from_batch(batch: &RecordBatch) -> Result<Vec<Chunk>> {
	let content = string_column(batch, "content").ok_or_else(|| anyhow!("content column missing or not utf8"))?;
	let id = string_column(batch, "id");
	let section = string_column(batch, "section");
	let source = string_column(batch, "source");
	let page = int_column(batch, "page");
	let chunk_index = int_column(batch, "chunk_index");
	let total_chunks = int_column(batch, "total_chunks");

	let mut chunks = Vec::with_capacity(batch.num_rows());
	for i in 0..batch.num_rows() {
		if content.is_null(i) {
			return Err(anyhow!("row {} has null content", i));
		}
		chunks.push(Chunk {
			id: opt_string(id, i),
			content: content.value(i).to_string(),
			section: opt_string(section, i).unwrap_or_else(|| Chunk::UNKNOWN_SECTION.to_string()),
			page: opt_int(page, i).and_then(|p| u32::try_from(p).ok()).unwrap_or(0),
			source: opt_string(source, i).unwrap_or_default(),
			chunk_index: opt_int(chunk_index, i).and_then(|v| usize::try_from(v).ok()).unwrap_or(0),
			total_chunks: opt_int(total_chunks, i).and_then(|v| usize::try_from(v).ok()).unwrap_or(1),
		});
	}
	Ok(chunks)
}

/// Row distances of a vector-search result batch.
pub fn distances_from_batch(batch: &RecordBatch) -> Result<Vec<f32>> {
	let col = batch
		.column_by_name(DISTANCE_COLUMN)
		.and_then(|c| c.as_any().downcast_ref::<Float32Array>())
		.ok_or_else(|| anyhow!("{} column missing from vector search result", DISTANCE_COLUMN))?;
	(0..batch.num_rows())
		.map(|i| {
			if col.is_null(i) {
				Err(anyhow!("null {} in vector search result row {}", DISTANCE_COLUMN, i))
			} else {
				Ok(col.value(i))
			}
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use arrow_schema::{DataType, Field, Schema};
	use std::sync::Arc;

	#[test]
	fn decodes_rows_with_missing_metadata() {
		let schema = Arc::new(Schema::new(vec![
			Field::new("content", DataType::Utf8, false),
			Field::new("section", DataType::Utf8, true),
			Field::new("page", DataType::Int32, true),
			Field::new(DISTANCE_COLUMN, DataType::Float32, true),
		]));
		let batch = RecordBatch::try_new(
			schema,
			vec![
				Arc::new(StringArray::from(vec!["first", "second"])),
				Arc::new(StringArray::from(vec![Some("§ 164"), None])),
				Arc::new(Int32Array::from(vec![Some(1343), None])),
				Arc::new(Float32Array::from(vec![Some(0.25), None])),
			],
		)
		.unwrap();

		let chunks = chunks_from_batch(&batch).unwrap();
		assert_eq!(chunks[0].section, "§ 164");
		assert_eq!(chunks[0].page, 1343);
		assert_eq!(chunks[1].section, "Unknown");
		assert_eq!(chunks[1].page, 0);
		assert!(chunks[1].id.is_none());

		let err = distances_from_batch(&batch).unwrap_err();
		assert!(err.to_string().contains("row 1"), "{err}");
		assert_eq!(distances_from_batch(&batch.slice(0, 1)).unwrap(), vec![0.25]);
	}

	#[test]
	fn missing_content_column_is_an_error() {
		let schema = Arc::new(Schema::new(vec![Field::new("section", DataType::Utf8, true)]));
		let batch = RecordBatch::try_new(schema, vec![Arc::new(StringArray::from(vec![Some("§ 1")]))]).unwrap();
		assert!(chunks_from_batch(&batch).is_err());
	}
}
