use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use localrag_core::traits::TokenCounter;
use localrag_core::types::{Chunk, ChunkRecord, GroupId, PageInfo};

use crate::block::parse_blocks;
use crate::builder::ChunkBuilder;
use crate::report::ChunkStats;

/// Per-page metadata produced upstream (crawl, summarisation, community
/// detection), keyed by the markdown file path relative to the corpus root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub file: String,
    pub url: String,
    pub summary: String,
    pub group_id: GroupId,
}

#[derive(Debug, Clone, Default)]
pub struct PageManifest {
    entries: HashMap<String, ManifestEntry>,
}

impl PageManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| format!("reading page manifest {}", path.display()))?;
        let entries: Vec<ManifestEntry> =
            serde_json::from_str(&raw).with_context(|| format!("parsing page manifest {}", path.display()))?;
        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(entries: Vec<ManifestEntry>) -> Self {
        Self { entries: entries.into_iter().map(|e| (e.file.clone(), e)).collect() }
    }

    pub fn get(&self, file: &str) -> Option<&ManifestEntry> {
        self.entries.get(file)
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

#[derive(Debug, Default)]
pub struct ProcessedCorpus {
    pub pages: Vec<PageInfo>,
    pub chunks: Vec<ChunkRecord>,
    pub stats: ChunkStats,
}

pub struct DocumentProcessor<'a> {
    counter: &'a dyn TokenCounter,
    min_informative_tokens: usize,
}

impl<'a> DocumentProcessor<'a> {
    pub fn new(counter: &'a dyn TokenCounter) -> Self {
        Self { counter, min_informative_tokens: 10 }
    }

    pub fn with_min_informative_tokens(mut self, tokens: usize) -> Self {
        self.min_informative_tokens = tokens;
        self
    }

    /// Every chunk of `text`, including near-empty ones.
    pub fn chunk_text(&self, text: &str) -> Vec<Chunk> {
        ChunkBuilder::new(self.counter).build(parse_blocks(text))
    }

    /// Rendered content and token count of the chunks worth storing.
    pub fn persistable_chunks(&self, text: &str) -> Vec<(String, usize)> {
        self.chunk_text(text)
            .into_iter()
            .filter(|c| c.token_count > self.min_informative_tokens)
            .map(|c| (collapse_blank_lines(&c.render()), c.token_count))
            .collect()
    }

    /// Persistable chunk sizes of every `.md` file under `data_dir`, manifest or not.
    pub fn collect_stats(&self, data_dir: &Path) -> Result<ChunkStats> {
        let mut stats = ChunkStats::default();
        for file_path in list_markdown_files(data_dir) {
            let content = read_file_content(&file_path)?;
            let counts: Vec<usize> = self.persistable_chunks(&content).into_iter().map(|(_, tokens)| tokens).collect();
            stats.record_file(&relative_key(&file_path, data_dir), &counts);
        }
        Ok(stats)
    }

    /// Chunk every `.md` file under `data_dir` that has a manifest entry.
    pub fn process_directory(&self, data_dir: &Path, manifest: &PageManifest) -> Result<ProcessedCorpus> {
        let files = list_markdown_files(data_dir);
        let mut corpus = ProcessedCorpus::default();
        if files.is_empty() {
            tracing::warn!(dir = %data_dir.display(), "no markdown files found");
            return Ok(corpus);
        }

        let mut chunk_counter = 0usize;
        for (file_index, file_path) in files.iter().enumerate() {
            let relative = relative_key(file_path, data_dir);
            let Some(entry) = manifest.get(&relative) else {
                tracing::warn!(file = %relative, "no manifest entry; skipping");
                continue;
            };
            let content = read_file_content(file_path)?;
            let chunks = self.persistable_chunks(&content);
            let token_counts: Vec<usize> = chunks.iter().map(|(_, tokens)| *tokens).collect();
            corpus.stats.record_file(&relative, &token_counts);
            if chunks.is_empty() {
                tracing::warn!(file = %relative, "document produced no informative chunks; skipping");
                continue;
            }

            let page_id = format!("p_{}_{}_{}", chunks.len(), short_hash(&entry.summary), corpus.pages.len());
            tracing::debug!(file = %relative, page_id = %page_id, chunks = chunks.len(), "processed {}/{}", file_index + 1, files.len());
            for (ordinal, (content, token_count)) in (1u32..).zip(chunks) {
                corpus.chunks.push(ChunkRecord {
                    chunk_id: format!("c_{}_{}", short_hash(&content), chunk_counter),
                    page_id: page_id.clone(),
                    content,
                    ordinal,
                    token_count,
                });
                chunk_counter += 1;
            }
            corpus.pages.push(PageInfo {
                page_id,
                url: entry.url.clone(),
                summary: entry.summary.clone(),
                group_id: entry.group_id,
                chunk_count: token_counts.len(),
            });
        }
        tracing::info!(pages = corpus.pages.len(), chunks = corpus.chunks.len(), "corpus chunked");
        Ok(corpus)
    }
}

static BLANK_LINE_RUNS: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(\n\s*){2,}").ok());

/// Collapse every whitespace run that starts at a newline and spans two or
/// more newlines into a single blank line (`\n\n`).
pub fn collapse_blank_lines(text: &str) -> String {
    match BLANK_LINE_RUNS.as_ref() {
        Some(re) => re.replace_all(text, "\n\n").into_owned(),
        None => text.to_string(),
    }
}

fn short_hash(s: &str) -> String {
    let hex = blake3::hash(s.as_bytes()).to_hex().to_string();
    hex[..16].to_string()
}

fn relative_key(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}

fn read_file_content(file_path: &Path) -> Result<String> {
    match fs::read_to_string(file_path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
    }
}

fn list_markdown_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("md"))
        .collect();
    files.sort();
    files
}
