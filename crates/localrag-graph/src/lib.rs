//! Page/chunk graph persisted as a JSON snapshot.
//!
//! Pages carry their community (`group_id`); chunks point at their page
//! through `page_id` and keep their position as `ordinal`. Every lookup reads
//! from one immutable snapshot, so a concurrent [`FileGraphStore::reload`]
//! never mixes two versions inside a single call.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use localrag_core::traits::GraphStore;
use localrag_core::types::{ChunkContent, ChunkId, ChunkRecord, PageId, PageInfo};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub pages: Vec<PageInfo>,
    pub chunks: Vec<ChunkRecord>,
}

impl GraphSnapshot {
    pub fn new(pages: Vec<PageInfo>, chunks: Vec<ChunkRecord>) -> Self {
        Self { pages, chunks }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| format!("reading graph snapshot {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing graph snapshot {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(self)?)?;
        fs::rename(&tmp, path).with_context(|| format!("writing graph snapshot {}", path.display()))?;
        tracing::info!(path = %path.display(), pages = self.pages.len(), chunks = self.chunks.len(), "graph snapshot saved");
        Ok(())
    }
}

/// Indexed, read-only view of a snapshot.
#[derive(Debug, Default)]
struct Graph {
    pages: HashMap<PageId, PageInfo>,
    chunks_by_page: HashMap<PageId, Vec<ChunkRecord>>,
}

impl From<GraphSnapshot> for Graph {
    fn from(snapshot: GraphSnapshot) -> Self {
        let mut chunks_by_page: HashMap<PageId, Vec<ChunkRecord>> = HashMap::new();
        for chunk in snapshot.chunks {
            chunks_by_page.entry(chunk.page_id.clone()).or_default().push(chunk);
        }
        for chunks in chunks_by_page.values_mut() {
            chunks.sort_by_key(|c| c.ordinal);
        }
        let pages = snapshot.pages.into_iter().map(|p| (p.page_id.clone(), p)).collect();
        Self { pages, chunks_by_page }
    }
}

pub struct FileGraphStore {
    path: Option<PathBuf>,
    graph: RwLock<Arc<Graph>>,
}

impl FileGraphStore {
    pub fn open(path: &Path) -> Result<Self> {
        let graph = Graph::from(GraphSnapshot::load(path)?);
        tracing::debug!(path = %path.display(), pages = graph.pages.len(), "graph store opened");
        Ok(Self { path: Some(path.to_path_buf()), graph: RwLock::new(Arc::new(graph)) })
    }

    pub fn from_snapshot(snapshot: GraphSnapshot) -> Self {
        Self { path: None, graph: RwLock::new(Arc::new(Graph::from(snapshot))) }
    }

    /// Re-read the backing file and swap it in for subsequent lookups.
    pub fn reload(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let fresh = Arc::new(Graph::from(GraphSnapshot::load(path)?));
        *self.graph.write().map_err(|_| anyhow::anyhow!("graph lock poisoned"))? = fresh;
        Ok(())
    }

    pub fn page_count(&self) -> Result<usize> {
        Ok(self.session()?.pages.len())
    }

    fn session(&self) -> Result<Arc<Graph>> {
        self.graph.read().map(|g| Arc::clone(&*g)).map_err(|_| anyhow::anyhow!("graph lock poisoned"))
    }
}

impl GraphStore for FileGraphStore {
    fn get_pages(&self, page_ids: &[PageId]) -> Result<HashMap<PageId, PageInfo>> {
        let graph = self.session()?;
        Ok(page_ids.iter().filter_map(|id| graph.pages.get(id).map(|p| (id.clone(), p.clone()))).collect())
    }

    fn get_chunks(&self, page_id: &str, chunk_ids: &[ChunkId]) -> Result<Vec<ChunkContent>> {
        let graph = self.session()?;
        let wanted: HashSet<&str> = chunk_ids.iter().map(String::as_str).collect();
        Ok(graph
            .chunks_by_page
            .get(page_id)
            .map(|chunks| {
                chunks
                    .iter()
                    .filter(|c| wanted.contains(c.chunk_id.as_str()))
                    .map(|c| ChunkContent { chunk_id: c.chunk_id.clone(), content: c.content.clone(), ordinal: c.ordinal })
                    .collect()
            })
            .unwrap_or_default())
    }
}
