use anyhow::{anyhow, Context, Result};
use reqwest::blocking::{Client, Response};
use serde::Serialize;
use serde_json::{json, Value};
use std::io::BufReader;
use std::time::Duration;

use localrag_core::config::{EmbeddingSettings, LlmSettings};
use localrag_core::error::Error;
use localrag_core::stream::TokenStream;
use localrag_core::traits::ChatModel;
use localrag_core::types::GenerationRequest;

use crate::sse::SseEvents;

/// Longest error body echoed into an error message.
const MAX_ERROR_BODY: usize = 512;

/// One authenticated connection to an OpenAI-style API. Implements
/// [`localrag_core::traits::Embedder`], [`localrag_core::traits::QueryRewriter`]
/// and [`ChatModel`]. Requests are sent once; failures are not retried.
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: String,
    pub(crate) llm: LlmSettings,
    pub(crate) embedding: EmbeddingSettings,
}

impl OpenAiClient {
    pub fn new(llm: &LlmSettings, embedding: &EmbeddingSettings) -> localrag_core::error::Result<Self> {
        let api_key = llm.require_api_key()?.to_string();
        let http = Client::builder()
            .timeout(Duration::from_secs(llm.timeout_secs))
            .gzip(true)
            .build()
            .map_err(|e| Error::service("llm", e))?;
        Ok(Self {
            http,
            base_url: llm.base_url.trim_end_matches('/').to_string(),
            api_key,
            llm: llm.clone(),
            embedding: embedding.clone(),
        })
    }

    fn send<B: Serialize>(&self, path: &str, body: &B) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .with_context(|| format!("POST {url}"))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let mut text = response.text().unwrap_or_default();
        if text.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY).rev().find(|i| text.is_char_boundary(*i)).unwrap_or(0);
            text.truncate(cut);
        }
        Err(anyhow!("POST {url} returned {status}: {text}"))
    }

    pub(crate) fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<Value> {
        let response = self.send(path, body)?;
        response.json::<Value>().map_err(|e| Error::Format(format!("{path} response is not JSON: {e}")).into())
    }

    pub(crate) fn post_stream<B: Serialize>(&self, path: &str, body: &B) -> Result<TokenStream> {
        let response = self.send(path, body)?;
        Ok(TokenStream::new(SseEvents::new(BufReader::new(response))))
    }
}

pub fn chat_request_body(model: &str, request: &GenerationRequest) -> Value {
    let mut body = json!({
        "model": model,
        "messages": [
            { "role": "system", "content": request.system },
            { "role": "user", "content": request.user },
        ],
        "stream": true,
    });
    if let Some(max_tokens) = request.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }
    body
}

impl ChatModel for OpenAiClient {
    fn stream(&self, request: &GenerationRequest) -> Result<TokenStream> {
        tracing::debug!(model = %self.llm.chat_model, max_tokens = ?request.max_tokens, "starting chat stream");
        self.post_stream("/chat/completions", &chat_request_body(&self.llm.chat_model, request))
    }
}
