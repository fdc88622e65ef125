//! OpenAI-compatible HTTP backends: embeddings, structured query rewrite and
//! streamed chat completions. Blocking transport; call from outside any async
//! runtime.

pub mod client;
pub mod embeddings;
pub mod rewrite;
pub mod sse;

pub use client::OpenAiClient;
pub use rewrite::{parse_rewrite, rewrite_schema};
pub use sse::{parse_sse_line, SseEvents};
