use anyhow::{anyhow, Result};
use std::path::Path;

use localrag_core::config::ChunkingSettings;
use localrag_core::traits::TokenCounter;
use tiktoken_rs::CoreBPE;
use tokenizers::Tokenizer;

/// `o200k_base` BPE counts. The chunk size thresholds are expressed in these tokens.
pub struct TiktokenCounter {
    bpe: CoreBPE,
}

impl TiktokenCounter {
    pub fn o200k() -> Result<Self> {
        let bpe = tiktoken_rs::o200k_base().map_err(|e| anyhow!("Failed to load o200k_base tokenizer: {e}"))?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

/// Counts from a HuggingFace `tokenizer.json`, without special tokens.
pub struct HfTokenCounter {
    tokenizer: Tokenizer,
    fallback: TiktokenCounter,
}

impl HfTokenCounter {
    pub fn from_file(path: &Path) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", path.display(), e))?;
        Ok(Self { tokenizer, fallback: TiktokenCounter::o200k()? })
    }
}

impl TokenCounter for HfTokenCounter {
    fn count(&self, text: &str) -> usize {
        let encoded = self.tokenizer.encode(text, false).map(|enc| enc.len());
        count_or_fallback(encoded, text, &self.fallback)
    }
}

/// A block the tokenizer rejects is measured with `o200k_base` instead of being dropped to zero.
fn count_or_fallback(encoded: tokenizers::Result<usize>, text: &str, fallback: &TiktokenCounter) -> usize {
    match encoded {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!(error = %e, chars = text.len(), "tokenizer failed to encode block; counting with o200k_base");
            fallback.count(text)
        }
    }
}

pub fn counter_from_settings(settings: &ChunkingSettings) -> Result<Box<dyn TokenCounter>> {
    match settings.tokenizer_path.as_deref() {
        Some(path) => {
            let path = localrag_core::config::expand_path(path);
            tracing::info!(tokenizer = %path.display(), "counting tokens with tokenizer file");
            Ok(Box::new(HfTokenCounter::from_file(&path)?))
        }
        None => {
            tracing::info!("counting tokens with o200k_base");
            Ok(Box::new(TiktokenCounter::o200k()?))
        }
    }
}
