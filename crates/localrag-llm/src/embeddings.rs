use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use localrag_core::error::Error;
use localrag_core::traits::Embedder;

use crate::client::OpenAiClient;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    index: usize,
    embedding: Vec<f32>,
}

/// Vectors of an `/embeddings` response in input order.
pub fn parse_embeddings(value: Value, expected: usize, dim: usize) -> Result<Vec<Vec<f32>>> {
    let mut response: EmbedResponse =
        serde_json::from_value(value).map_err(|e| Error::Format(format!("embedding response: {e}")))?;
    if response.data.len() != expected {
        return Err(Error::Format(format!("expected {expected} embeddings, got {}", response.data.len())).into());
    }
    response.data.sort_by_key(|d| d.index);
    if let Some(bad) = response.data.iter().find(|d| d.embedding.len() != dim) {
        return Err(Error::Format(format!("embedding {} has dimension {}, expected {dim}", bad.index, bad.embedding.len())).into());
    }
    Ok(response.data.into_iter().map(|d| d.embedding).collect())
}

impl Embedder for OpenAiClient {
    fn dim(&self) -> usize { self.embedding.dimension }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let model = self.embedding.model.as_str();
        let request = EmbedRequest {
            model,
            input: texts,
            // Only the v3 models accept a reduced output size.
            dimensions: model.starts_with("text-embedding-3").then_some(self.embedding.dimension),
        };
        let value = self.post_json("/embeddings", &request)?;
        let vectors = parse_embeddings(value, texts.len(), self.embedding.dimension)?;
        tracing::debug!(model, count = vectors.len(), "embedded texts");
        Ok(vectors)
    }
}
