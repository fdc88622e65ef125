//! Wiring shared by the `localrag-*` binaries.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use localrag_core::config::{Config, Settings};
use localrag_core::logging::init_tracing;
use localrag_core::traits::Embedder;
use localrag_llm::OpenAiClient;

/// Tracing on, configuration layers merged, defaults filled in.
pub fn load_settings() -> Result<Settings> {
    init_tracing();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;
    Ok(config.settings()?)
}

/// The local model (or fake) when configured, otherwise the HTTP embedder.
pub fn build_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    if let Some(local) = localrag_embed::local_embedder(&settings.embedding)? {
        return Ok(Arc::from(local));
    }
    Ok(Arc::new(OpenAiClient::new(&settings.llm, &settings.embedding)?))
}

/// Positional arguments and `--flags`, in order. Unknown flags are rejected.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub positional: Vec<String>,
    pub flags: Vec<String>,
}

impl CliArgs {
    pub fn parse<I: IntoIterator<Item = String>>(args: I, known_flags: &[&str]) -> Result<Self> {
        let mut parsed = Self::default();
        for arg in args {
            if arg.starts_with("--") {
                if !known_flags.contains(&arg.as_str()) {
                    anyhow::bail!("unknown flag {arg}; expected one of {}", known_flags.join(", "));
                }
                parsed.flags.push(arg);
            } else {
                parsed.positional.push(arg);
            }
        }
        Ok(parsed)
    }

    pub fn has(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    /// First positional argument as a path, or `fallback`.
    pub fn dir_or(&self, fallback: PathBuf) -> PathBuf {
        self.positional.first().map(PathBuf::from).unwrap_or(fallback)
    }
}
