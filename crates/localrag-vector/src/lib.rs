//! LanceDB-backed vector collections: `summaries` (one row per page) and
//! `chunks` (one row per chunk, carrying `page_id` for filtered search).

pub mod schema;
pub mod store;
pub mod writer;

pub use store::{in_predicate, LanceVectorStore};
pub use writer::embed_with_progress;
