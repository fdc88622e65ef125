//! Capabilities the pipeline is wired from. Every external service sits behind
//! one of these so the algorithms can run against deterministic fakes.

use std::collections::HashMap;

use crate::stream::TokenStream;
use crate::types::{ChunkContent, ChunkId, GenerationRequest, InFilter, PageId, PageInfo, QueryRewrite, RankedList};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    /// Order-preserving: `result[i]` embeds `texts[i]`.
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

pub trait VectorStore: Send + Sync {
    /// One ranked id list per query embedding, nearest first.
    fn query(
        &self,
        collection: &str,
        embeddings: &[Vec<f32>],
        top_n: usize,
        filter: Option<&InFilter>,
    ) -> anyhow::Result<Vec<RankedList>>;
}

pub trait GraphStore: Send + Sync {
    /// Ids unknown to the store are absent from the map.
    fn get_pages(&self, page_ids: &[PageId]) -> anyhow::Result<HashMap<PageId, PageInfo>>;

    /// Chunks of `page_id` whose id is in `chunk_ids`, ordinal ascending.
    fn get_chunks(&self, page_id: &str, chunk_ids: &[ChunkId]) -> anyhow::Result<Vec<ChunkContent>>;
}

pub trait QueryRewriter: Send + Sync {
    fn rewrite(&self, history: &str, query: &str, count: usize) -> anyhow::Result<QueryRewrite>;
}

pub trait ChatModel: Send + Sync {
    fn stream(&self, request: &GenerationRequest) -> anyhow::Result<TokenStream>;
}

pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}
