//! Local embedding backends: BGE-M3 on candle and a deterministic fake.

use anyhow::Result;

use localrag_core::config::{EmbeddingProvider, EmbeddingSettings};
use localrag_core::traits::Embedder;

pub mod device;
pub mod fake;
pub mod model;
pub mod pool;
pub mod tokenize;

pub use fake::FakeEmbedder;
pub use model::{resolve_model_dir, BgeM3Embedder, BGE_M3_DIM};

/// `APP_USE_FAKE_EMBEDDINGS=1` (or `true`) swaps any local model for [`FakeEmbedder`].
pub fn fake_embeddings_forced() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Build the in-process embedder for `settings`. `None` means the provider is
/// remote and has to be built by the HTTP client crate.
pub fn local_embedder(settings: &EmbeddingSettings) -> Result<Option<Box<dyn Embedder>>> {
    if settings.provider == EmbeddingProvider::Fake || fake_embeddings_forced() {
        tracing::info!(dim = settings.dimension, "using fake embedder");
        return Ok(Some(Box::new(FakeEmbedder::new(settings.dimension))));
    }
    match settings.provider {
        EmbeddingProvider::Local => {
            let dir = resolve_model_dir(settings.model_dir.as_deref())?;
            if settings.dimension != BGE_M3_DIM {
                tracing::warn!(configured = settings.dimension, actual = BGE_M3_DIM, "embedding.dimension ignored for the local model");
            }
            Ok(Some(Box::new(BgeM3Embedder::load(&dir)?)))
        }
        EmbeddingProvider::OpenAi | EmbeddingProvider::Fake => Ok(None),
    }
}
