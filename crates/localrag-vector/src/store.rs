use anyhow::{anyhow, Context, Result};
use arrow_array::{Array, Float32Array, RecordBatch, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, DistanceType, Table};
use std::path::Path;
use tokio::runtime::Runtime;

use localrag_core::error::Error;
use localrag_core::traits::VectorStore;
use localrag_core::types::{ChunkRecord, InFilter, PageInfo, RankedList};

use crate::schema::ID_COLUMN;
use crate::writer::{write_chunks, write_summaries};

/// LanceDB directory exposed through the blocking [`VectorStore`] seam.
///
/// Owns a runtime and drives every async LanceDB call with `block_on`, so it
/// must not be used from inside another tokio runtime.
pub struct LanceVectorStore {
    rt: Runtime,
    db: Connection,
}

impl LanceVectorStore {
    pub fn open(dir: &Path) -> Result<Self> {
        let rt = Runtime::new()?;
        let uri = dir.to_string_lossy().to_string();
        let db = rt.block_on(async { connect(&uri).execute().await }).with_context(|| format!("opening LanceDB at {uri}"))?;
        tracing::debug!(uri = %uri, "vector store opened");
        Ok(Self { rt, db })
    }

    pub fn write_summaries(&self, table: &str, pages: &[PageInfo], vectors: &[Vec<f32>]) -> Result<usize> {
        self.rt.block_on(write_summaries(&self.db, table, pages, vectors))
    }

    pub fn write_chunks(&self, table: &str, chunks: &[ChunkRecord], vectors: &[Vec<f32>]) -> Result<usize> {
        self.rt.block_on(write_chunks(&self.db, table, chunks, vectors))
    }

    pub fn count_rows(&self, table: &str) -> Result<usize> {
        self.rt.block_on(async {
            let t = self.open_collection(table).await?;
            Ok(t.count_rows(None).await?)
        })
    }

    async fn open_collection(&self, name: &str) -> Result<Table> {
        let names = self.db.table_names().execute().await?;
        if !names.iter().any(|n| n == name) {
            return Err(Error::NotFound(format!("vector collection '{name}'")).into());
        }
        Ok(self.db.open_table(name).execute().await?)
    }

    async fn search_one(&self, collection: &str, embedding: &[f32], top_n: usize, predicate: Option<&str>) -> Result<RankedList> {
        let table = self.open_collection(collection).await?;
        let mut query = table.vector_search(embedding.to_vec())?.distance_type(DistanceType::Cosine).limit(top_n);
        if let Some(predicate) = predicate {
            query = query.only_if(predicate);
        }
        let mut stream = query.execute().await?;
        let mut scored: Vec<(String, f32)> = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            scored.extend(ids_with_distance(&batch)?);
        }
        // Nearest first; batches are not guaranteed to arrive in order.
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        let mut ranked = RankedList::with_capacity(scored.len());
        for (id, _) in scored {
            if !ranked.contains(&id) {
                ranked.push(id);
            }
        }
        ranked.truncate(top_n);
        Ok(ranked)
    }
}

impl VectorStore for LanceVectorStore {
    fn query(&self, collection: &str, embeddings: &[Vec<f32>], top_n: usize, filter: Option<&InFilter>) -> Result<Vec<RankedList>> {
        if filter.is_some_and(|f| f.values.is_empty()) {
            return Ok(vec![RankedList::new(); embeddings.len()]);
        }
        let predicate = filter.map(in_predicate);
        self.rt.block_on(async {
            let mut lists = Vec::with_capacity(embeddings.len());
            for embedding in embeddings {
                lists.push(self.search_one(collection, embedding, top_n, predicate.as_deref()).await?);
            }
            tracing::debug!(collection, queries = lists.len(), top_n, filtered = predicate.is_some(), "vector query done");
            Ok(lists)
        })
    }
}

/// SQL `field IN ('a', 'b')` with single quotes escaped.
pub fn in_predicate(filter: &InFilter) -> String {
    let values: Vec<String> = filter.values.iter().map(|v| format!("'{}'", v.replace('\'', "''"))).collect();
    format!("{} IN ({})", filter.field, values.join(", "))
}

fn ids_with_distance(batch: &RecordBatch) -> Result<Vec<(String, f32)>> {
    let ids = batch
        .column_by_name(ID_COLUMN)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("result batch has no string '{ID_COLUMN}' column"))?;
    let distances = batch.column_by_name("_distance").and_then(|c| c.as_any().downcast_ref::<Float32Array>());
    Ok((0..batch.num_rows())
        .map(|i| {
            let distance = distances.filter(|d| !d.is_null(i)).map_or(f32::MAX, |d| d.value(i));
            (ids.value(i).to_string(), distance)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_predicate_quotes_and_escapes() {
        let filter = InFilter::new("page_id", vec!["p_1".into(), "o'brien".into()]);
        assert_eq!(in_predicate(&filter), "page_id IN ('p_1', 'o''brien')");
    }
}
