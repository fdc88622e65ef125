use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const ID_COLUMN: &str = "id";
pub const PAGE_ID_COLUMN: &str = "page_id";
pub const VECTOR_COLUMN: &str = "vector";

pub fn vector_field(dim: i32) -> Field {
    Field::new(VECTOR_COLUMN, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true)
}

/// One row per page: the page id and the summary text that was embedded.
pub fn summaries_schema(dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new(ID_COLUMN, DataType::Utf8, false),
        Field::new("content", DataType::Utf8, false),
        vector_field(dim),
    ]))
}

/// One row per chunk; `page_id` is the metadata field retrieval filters on.
pub fn chunks_schema(dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new(ID_COLUMN, DataType::Utf8, false),
        Field::new(PAGE_ID_COLUMN, DataType::Utf8, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("ordinal", DataType::Int32, false),
        vector_field(dim),
    ]))
}
