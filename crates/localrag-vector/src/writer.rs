use anyhow::{anyhow, ensure, Result};
use arrow_array::types::Float32Type;
use arrow_array::{FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use arrow_schema::Schema;
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::Connection;
use std::sync::Arc;

use localrag_core::traits::Embedder;
use localrag_core::types::{ChunkRecord, PageInfo};

use crate::schema::{chunks_schema, summaries_schema};

/// Rows per LanceDB append.
const WRITE_BATCH: usize = 1000;

/// Embed `texts` in batches of `batch_size`, showing progress under `label`.
pub fn embed_with_progress(embedder: &dyn Embedder, texts: &[String], batch_size: usize, label: &str) -> Result<Vec<Vec<f32>>> {
    let pb = ProgressBar::new(texts.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg} ({percent}%)")?
            .progress_chars("#>-"),
    );
    pb.set_message(label.to_string());
    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size.max(1)) {
        let embedded = embedder.embed_batch(batch)?;
        ensure!(embedded.len() == batch.len(), "embedder returned {} vectors for {} texts", embedded.len(), batch.len());
        vectors.extend(embedded);
        pb.inc(batch.len() as u64);
    }
    pb.finish_with_message(format!("{label} embedded"));
    Ok(vectors)
}

pub async fn write_summaries(db: &Connection, table: &str, pages: &[PageInfo], vectors: &[Vec<f32>]) -> Result<usize> {
    ensure!(pages.len() == vectors.len(), "pages and embeddings length must match");
    let dim = vector_dim(vectors)?;
    let schema = summaries_schema(dim);
    let mut batches = Vec::new();
    for (rows, vecs) in pages.chunks(WRITE_BATCH).zip(vectors.chunks(WRITE_BATCH)) {
        batches.push(RecordBatch::try_new(schema.clone(), vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|p| p.page_id.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|p| p.summary.as_str()))),
            Arc::new(vector_array(vecs, dim)),
        ])?);
    }
    replace_table(db, table, schema, batches).await?;
    tracing::info!(table, rows = pages.len(), "summaries written");
    Ok(pages.len())
}

pub async fn write_chunks(db: &Connection, table: &str, chunks: &[ChunkRecord], vectors: &[Vec<f32>]) -> Result<usize> {
    ensure!(chunks.len() == vectors.len(), "chunks and embeddings length must match");
    let dim = vector_dim(vectors)?;
    let schema = chunks_schema(dim);
    let mut batches = Vec::new();
    for (rows, vecs) in chunks.chunks(WRITE_BATCH).zip(vectors.chunks(WRITE_BATCH)) {
        let ordinals = rows.iter().map(|c| i32::try_from(c.ordinal)).collect::<Result<Vec<_>, _>>()?;
        batches.push(RecordBatch::try_new(schema.clone(), vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|c| c.chunk_id.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|c| c.page_id.as_str()))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|c| c.content.as_str()))),
            Arc::new(Int32Array::from(ordinals)),
            Arc::new(vector_array(vecs, dim)),
        ])?);
    }
    replace_table(db, table, schema, batches).await?;
    tracing::info!(table, rows = chunks.len(), "chunks written");
    Ok(chunks.len())
}

/// Create `table` from `batches`, or clear and refill it when it exists.
async fn replace_table(db: &Connection, table: &str, schema: Arc<Schema>, batches: Vec<RecordBatch>) -> Result<()> {
    let reader = Box::new(RecordBatchIterator::new(batches.into_iter().map(Ok), schema));
    if db.table_names().execute().await?.iter().any(|n| n == table) {
        let existing = db.open_table(table).execute().await?;
        existing.delete("true").await?;
        existing.add(reader).execute().await?;
    } else {
        db.create_table(table, reader).execute().await?;
    }
    Ok(())
}

fn vector_dim(vectors: &[Vec<f32>]) -> Result<i32> {
    let dim = vectors.first().map_or(0, Vec::len);
    ensure!(dim > 0, "cannot write a table without embeddings");
    ensure!(vectors.iter().all(|v| v.len() == dim), "embeddings have inconsistent dimensions");
    i32::try_from(dim).map_err(|_| anyhow!("embedding dimension {dim} too large"))
}

fn vector_array(vectors: &[Vec<f32>], dim: i32) -> FixedSizeListArray {
    FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
        vectors.iter().map(|v| Some(v.iter().copied().map(Some).collect::<Vec<_>>())),
        dim,
    )
}
