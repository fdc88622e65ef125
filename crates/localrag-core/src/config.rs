//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_LLM__API_KEY`). Every settings field
//! has a default so a missing file is not an error; missing credentials are
//! reported by [`Settings::validate`] and [`LlmSettings::require_api_key`].

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::types::GroupId;

/// Group exempt from the rerank cutoff. Matches the "uncategorized" community
/// of the deployment the page graph was built for.
pub const DEFAULT_OVERFLOW_GROUP: GroupId = 17;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        tracing::debug!(env = %env_name, "configuration layers merged");
        Ok(Self { figment })
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn from_toml_str(toml: &str) -> Self {
        Self { figment: Figment::new().merge(Toml::string(toml)) }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// All settings with defaults filled in. Callers that talk to external
    /// services run [`Settings::validate`] before doing any work.
    pub fn settings(&self) -> Result<Settings> {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(self.figment.clone())
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub llm: LlmSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.retrieval.validate()?;
        if self.embedding.dimension == 0 {
            return Err(Error::InvalidConfig("embedding.dimension must be positive".into()));
        }
        if self.embedding.provider == EmbeddingProvider::OpenAi {
            self.llm.require_api_key()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub markdown_dir: String,
    pub pages_manifest: String,
    pub graph_path: String,
    pub lancedb_dir: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            markdown_dir: "data/markdown_pages".to_string(),
            pages_manifest: "data/pages.json".to_string(),
            graph_path: "data/graph.json".to_string(),
            lancedb_dir: "data/indexes/lancedb".to_string(),
        }
    }
}

impl DataSettings {
    pub fn markdown_dir(&self) -> PathBuf { expand_path(&self.markdown_dir) }
    pub fn pages_manifest(&self) -> PathBuf { expand_path(&self.pages_manifest) }
    pub fn graph_path(&self) -> PathBuf { expand_path(&self.graph_path) }
    pub fn lancedb_dir(&self) -> PathBuf { expand_path(&self.lancedb_dir) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// HuggingFace `tokenizer.json`; word-count estimate when unset.
    pub tokenizer_path: Option<String>,
    /// Chunks at or below this many tokens are not persisted.
    pub min_informative_tokens: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { tokenizer_path: None, min_informative_tokens: 10 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    OpenAi,
    Local,
    Fake,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    /// Model directory for the local backend.
    pub model_dir: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::OpenAi,
            model: "text-embedding-3-large".to_string(),
            dimension: 3072,
            model_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub summaries_collection: String,
    pub chunks_collection: String,
    pub summary_top_n: usize,
    pub page_top_k: usize,
    pub select_amount: usize,
    pub chunk_top_n: usize,
    pub chunk_top_k: usize,
    pub rewrite_count: usize,
    pub history_limit: usize,
    pub overflow_group: Option<GroupId>,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            summaries_collection: "summaries".to_string(),
            chunks_collection: "chunks".to_string(),
            summary_top_n: 36,
            page_top_k: 12,
            select_amount: 8,
            chunk_top_n: 128,
            chunk_top_k: 40,
            rewrite_count: 3,
            history_limit: 12,
            overflow_group: Some(DEFAULT_OVERFLOW_GROUP),
        }
    }
}

impl RetrievalSettings {
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("retrieval.summary_top_n", self.summary_top_n),
            ("retrieval.page_top_k", self.page_top_k),
            ("retrieval.select_amount", self.select_amount),
            ("retrieval.chunk_top_n", self.chunk_top_n),
            ("retrieval.chunk_top_k", self.chunk_top_k),
            ("retrieval.rewrite_count", self.rewrite_count),
        ];
        if let Some((key, _)) = sizes.iter().find(|(_, v)| *v == 0) {
            return Err(Error::InvalidConfig(format!("{key} must be positive")));
        }
        if self.select_amount > self.page_top_k {
            return Err(Error::InvalidConfig(format!(
                "retrieval.select_amount ({}) exceeds retrieval.page_top_k ({})",
                self.select_amount, self.page_top_k
            )));
        }
        if self.summaries_collection.is_empty() || self.chunks_collection.is_empty() {
            return Err(Error::InvalidConfig("collection names must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub rewrite_model: String,
    pub chat_model: String,
    pub rewrite_max_tokens: u32,
    /// Answer budget when retrieved context is attached.
    pub answer_max_tokens: u32,
    /// Answer budget without retrieved context.
    pub plain_answer_max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            rewrite_model: "gpt-4o".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            rewrite_max_tokens: 8000,
            answer_max_tokens: 16000,
            plain_answer_max_tokens: 8000,
            timeout_secs: 120,
        }
    }
}

impl LlmSettings {
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(Error::InvalidConfig("llm.api_key is required (set APP_LLM__API_KEY)".into())),
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
