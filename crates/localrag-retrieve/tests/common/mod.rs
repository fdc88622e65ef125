//! Deterministic stand-ins for the external services.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use localrag_core::error::Error;
use localrag_core::stream::TokenStream;
use localrag_core::traits::{ChatModel, Embedder, QueryRewriter, VectorStore};
use localrag_core::types::{GenerationRequest, InFilter, ItemId, QueryRewrite, RankedList};

/// Embeds each known query as a one-hot vector over `vocab`.
pub struct OneHotEmbedder {
    pub vocab: Vec<String>,
    pub calls: Mutex<usize>,
}

impl OneHotEmbedder {
    pub fn new(vocab: &[&str]) -> Self {
        Self { vocab: vocab.iter().map(|s| s.to_string()).collect(), calls: Mutex::new(0) }
    }
}

impl Embedder for OneHotEmbedder {
    fn dim(&self) -> usize { self.vocab.len() }

    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        *self.calls.lock().expect("lock") += 1;
        texts
            .iter()
            .map(|t| {
                let idx = self.vocab.iter().position(|v| v == t).ok_or_else(|| anyhow::anyhow!("unknown query {t}"))?;
                let mut v = vec![0.0; self.vocab.len()];
                v[idx] = 1.0;
                Ok(v)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorCall {
    pub collection: String,
    pub top_n: usize,
    pub filter: Option<InFilter>,
}

/// Canned nearest-neighbour lists per collection and one-hot query index.
/// Chunk rows know their page so `page_id IN (...)` filters apply.
#[derive(Default)]
pub struct ScriptedVectorStore {
    pub lists: HashMap<(String, usize), RankedList>,
    pub page_of: HashMap<ItemId, ItemId>,
    pub calls: Mutex<Vec<VectorCall>>,
}

impl ScriptedVectorStore {
    pub fn with_list(mut self, collection: &str, query: usize, ids: &[&str]) -> Self {
        self.lists.insert((collection.to_string(), query), ids.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_chunk_pages(mut self, pairs: &[(&str, &str)]) -> Self {
        self.page_of.extend(pairs.iter().map(|(c, p)| (c.to_string(), p.to_string())));
        self
    }

    pub fn calls(&self) -> Vec<VectorCall> {
        self.calls.lock().expect("lock").clone()
    }
}

impl VectorStore for ScriptedVectorStore {
    fn query(&self, collection: &str, embeddings: &[Vec<f32>], top_n: usize, filter: Option<&InFilter>) -> anyhow::Result<Vec<RankedList>> {
        self.calls.lock().expect("lock").push(VectorCall { collection: collection.into(), top_n, filter: filter.cloned() });
        Ok(embeddings
            .iter()
            .map(|e| {
                let query = e.iter().position(|x| *x == 1.0).unwrap_or(usize::MAX);
                let list = self.lists.get(&(collection.to_string(), query)).cloned().unwrap_or_default();
                list.into_iter()
                    .filter(|id| match filter {
                        Some(f) => self.page_of.get(id).is_some_and(|p| f.values.contains(p)),
                        None => true,
                    })
                    .take(top_n)
                    .collect()
            })
            .collect())
    }
}

/// Returns `lists` verbatim, whatever the query.
pub struct FixedVectorStore(pub Vec<RankedList>);

impl VectorStore for FixedVectorStore {
    fn query(&self, _: &str, _: &[Vec<f32>], _: usize, _: Option<&InFilter>) -> anyhow::Result<Vec<RankedList>> {
        Ok(self.0.clone())
    }
}

pub struct DownVectorStore;

impl VectorStore for DownVectorStore {
    fn query(&self, _: &str, _: &[Vec<f32>], _: usize, _: Option<&InFilter>) -> anyhow::Result<Vec<RankedList>> {
        Err(anyhow::anyhow!("connection refused"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RewriteCall {
    pub history: String,
    pub query: String,
    pub count: usize,
}

pub struct ScriptedRewriter {
    pub outcome: Result<QueryRewrite, String>,
    pub calls: Mutex<Vec<RewriteCall>>,
}

impl ScriptedRewriter {
    pub fn retrieving(queries: &[&str]) -> Self {
        Self::answering(QueryRewrite { retrieval_needed: true, queries: queries.iter().map(|s| s.to_string()).collect() })
    }

    pub fn answering(rewrite: QueryRewrite) -> Self {
        Self { outcome: Ok(rewrite), calls: Mutex::new(Vec::new()) }
    }

    pub fn malformed(message: &str) -> Self {
        Self { outcome: Err(message.to_string()), calls: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> Vec<RewriteCall> {
        self.calls.lock().expect("lock").clone()
    }
}

impl QueryRewriter for ScriptedRewriter {
    fn rewrite(&self, history: &str, query: &str, count: usize) -> anyhow::Result<QueryRewrite> {
        self.calls.lock().expect("lock").push(RewriteCall { history: history.into(), query: query.into(), count });
        match &self.outcome {
            Ok(rewrite) => Ok(rewrite.clone()),
            Err(message) => Err(Error::Format(message.clone()).into()),
        }
    }
}

pub struct RecordingChat {
    pub reply: Vec<String>,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl RecordingChat {
    pub fn replying(deltas: &[&str]) -> Self {
        Self { reply: deltas.iter().map(|s| s.to_string()).collect(), requests: Mutex::new(Vec::new()) }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

impl ChatModel for RecordingChat {
    fn stream(&self, request: &GenerationRequest) -> anyhow::Result<TokenStream> {
        self.requests.lock().expect("lock").push(request.clone());
        Ok(TokenStream::from_deltas(self.reply.clone()))
    }
}
