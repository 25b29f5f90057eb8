use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// Layout of a chunk table: one row per chunk with its embedding.
///
/// Metadata columns are nullable; readers substitute defaults.
pub fn build_arrow_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("id", DataType::Utf8, true),
		Field::new("content", DataType::Utf8, false),
		Field::new("section", DataType::Utf8, true),
		Field::new("page", DataType::Int32, true),
		Field::new("source", DataType::Utf8, true),
		Field::new("chunk_index", DataType::Int32, true),
		Field::new("total_chunks", DataType::Int32, true),
		Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}

pub const DISTANCE_COLUMN: &str = "_distance";
