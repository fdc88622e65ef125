//! Domain types shared by the chunker, the stores and the retrieval pipeline.

use serde::{Deserialize, Serialize};

pub type ItemId = String;
pub type PageId = String;
pub type ChunkId = String;
pub type GroupId = i64;

/// Ids ordered best first (rank 0 = best), without duplicates.
pub type RankedList = Vec<ItemId>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Heading,
    Paragraph,
    BlankRun,
    Bullet,
}

/// One structural unit of a markdown document.
///
/// - `level`: heading depth 1-6, 0 for every other kind
/// - `content`: the source lines of the block joined with `\n`
/// - `blank_count`: number of lines in a blank run, 0 otherwise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    pub level: u8,
    pub content: String,
    pub blank_count: usize,
}

impl Block {
    pub fn heading(level: u8, content: impl Into<String>) -> Self {
        Self { kind: BlockKind::Heading, level, content: content.into(), blank_count: 0 }
    }

    pub fn paragraph(content: impl Into<String>) -> Self {
        Self { kind: BlockKind::Paragraph, level: 0, content: content.into(), blank_count: 0 }
    }

    pub fn blank_run(lines: &[&str]) -> Self {
        Self { kind: BlockKind::BlankRun, level: 0, content: lines.join("\n"), blank_count: lines.len() }
    }

    pub fn bullet(content: impl Into<String>) -> Self {
        Self { kind: BlockKind::Bullet, level: 0, content: content.into(), blank_count: 0 }
    }
}

/// A contiguous run of blocks produced by the chunk builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub blocks: Vec<Block>,
    pub token_count: usize,
}

impl Chunk {
    /// Block contents, each terminated by a newline.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.blocks.iter().map(|b| b.content.len() + 1).sum());
        for block in &self.blocks {
            out.push_str(&block.content);
            out.push('\n');
        }
        out
    }
}

/// Page entity as held by the graph store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page_id: PageId,
    pub url: String,
    pub summary: String,
    pub group_id: GroupId,
    pub chunk_count: usize,
}

/// Persisted chunk row: what the indexer writes and the graph store serves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub chunk_id: ChunkId,
    pub page_id: PageId,
    pub content: String,
    /// 1-based position within the page.
    pub ordinal: u32,
    pub token_count: usize,
}

/// Chunk text returned by the graph content lookup, ordered by `ordinal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkContent {
    pub chunk_id: ChunkId,
    pub content: String,
    pub ordinal: u32,
}

pub type ChunkContext = ChunkContent;

/// One page of assembled context: its summary plus the retrieved chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct PageContext {
    pub page_id: PageId,
    pub url: String,
    pub summary: String,
    pub chunks: Vec<ChunkContext>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self { role: role.into(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self { Self::new("user", content) }

    pub fn assistant(content: impl Into<String>) -> Self { Self::new("assistant", content) }
}

/// Outcome of the structured rewrite call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRewrite {
    pub retrieval_needed: bool,
    pub queries: Vec<String>,
}

/// Equality filter on a metadata field: `field IN values`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFilter {
    pub field: String,
    pub values: Vec<String>,
}

impl InFilter {
    pub fn new(field: impl Into<String>, values: Vec<String>) -> Self {
        Self { field: field.into(), values }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: Option<u32>,
}
