//! Query variants → ranked, group-aware page selection → chunk context.

use std::sync::Arc;

use localrag_core::config::RetrievalSettings;
use localrag_core::error::{Error, Result};
use localrag_core::traits::{Embedder, GraphStore, VectorStore};
use localrag_core::types::{InFilter, PageContext, RankedList};

use crate::context::RetrievedContext;
use crate::fusion::fuse;
use crate::rerank::rerank_by_group;

/// Metadata field chunk rows are filtered on.
pub const PAGE_ID_FIELD: &str = "page_id";

/// Stateless per call; the store handles are shared across requests.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    vectors: Arc<dyn VectorStore>,
    graph: Arc<dyn GraphStore>,
    settings: RetrievalSettings,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vectors: Arc<dyn VectorStore>,
        graph: Arc<dyn GraphStore>,
        settings: RetrievalSettings,
    ) -> Self {
        Self { embedder, vectors, graph, settings }
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    /// Retrieve context for the rewritten `queries`.
    pub fn retrieve(&self, queries: &[String]) -> Result<RetrievedContext> {
        if queries.is_empty() {
            return Err(Error::Input("no query variants to retrieve for".into()));
        }
        let s = &self.settings;

        let embeddings = self.embedder.embed_batch(queries).map_err(|e| Error::classify("embedding", e))?;
        if embeddings.len() != queries.len() {
            return Err(Error::Format(format!("{} embeddings for {} queries", embeddings.len(), queries.len())));
        }

        let summary_lists = self.query_vectors(&s.summaries_collection, &embeddings, s.summary_top_n, None)?;
        let fused_pages = fuse(&summary_lists, s.page_top_k);
        tracing::debug!(candidates = fused_pages.len(), "pages fused");

        let pages = self.graph.get_pages(&fused_pages).map_err(|e| Error::classify("graph store", e))?;
        let selected = rerank_by_group(
            &fused_pages,
            |id| pages.get(id).map(|p| p.group_id),
            Some(s.select_amount),
            s.overflow_group,
        );
        tracing::debug!(selected = ?selected, "pages selected");
        if selected.is_empty() {
            return Ok(RetrievedContext::default());
        }

        let filter = InFilter::new(PAGE_ID_FIELD, selected.clone());
        let chunk_lists = self.query_vectors(&s.chunks_collection, &embeddings, s.chunk_top_n, Some(&filter))?;
        let fused_chunks = fuse(&chunk_lists, s.chunk_top_k);
        tracing::debug!(chunks = fused_chunks.len(), "chunks fused");

        let mut context = RetrievedContext::default();
        for page_id in &selected {
            let chunks = self.graph.get_chunks(page_id, &fused_chunks).map_err(|e| Error::classify("graph store", e))?;
            if chunks.is_empty() {
                continue;
            }
            // `selected` only holds ids that resolved in `pages`.
            let Some(info) = pages.get(page_id) else { continue };
            context.pages.push(PageContext {
                page_id: page_id.clone(),
                url: info.url.clone(),
                summary: info.summary.clone(),
                chunks,
            });
        }
        tracing::info!(pages = context.pages.len(), chunks = context.chunk_count(), "context assembled");
        Ok(context)
    }

    fn query_vectors(
        &self,
        collection: &str,
        embeddings: &[Vec<f32>],
        top_n: usize,
        filter: Option<&InFilter>,
    ) -> Result<Vec<RankedList>> {
        let lists = self
            .vectors
            .query(collection, embeddings, top_n, filter)
            .map_err(|e| Error::classify("vector store", e))?;
        if lists.len() != embeddings.len() {
            return Err(Error::Format(format!(
                "{collection}: {} result lists for {} embeddings",
                lists.len(),
                embeddings.len()
            )));
        }
        Ok(lists)
    }
}
