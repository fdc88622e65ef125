//! Single-pass token delta stream with explicit end-of-stream signalling.

use serde_json::json;

use crate::error::{Error, Result};

/// Raw event produced by a generation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Delta(String),
    End,
}

/// Lazily pulls text deltas from a backend until its end marker.
///
/// Yields `Ok(delta)` per fragment and stops after [`StreamEvent::End`]. A
/// backend that runs dry without sending the marker produces one final
/// `Err(Error::Format)`. After the first error the stream is exhausted.
pub struct TokenStream {
    events: Box<dyn Iterator<Item = anyhow::Result<StreamEvent>> + Send>,
    done: bool,
}

impl TokenStream {
    pub fn new<I>(events: I) -> Self
    where
        I: Iterator<Item = anyhow::Result<StreamEvent>> + Send + 'static,
    {
        Self { events: Box::new(events), done: false }
    }

    /// A complete stream over in-memory fragments, terminated properly.
    pub fn from_deltas<I, S>(deltas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let events: Vec<anyhow::Result<StreamEvent>> = deltas
            .into_iter()
            .map(|d| Ok(StreamEvent::Delta(d.into())))
            .chain(std::iter::once(Ok(StreamEvent::End)))
            .collect();
        Self::new(events.into_iter())
    }

    /// Concatenate every delta; fails on the first stream error.
    pub fn collect_text(self) -> Result<String> {
        let mut out = String::new();
        for delta in self {
            out.push_str(&delta?);
        }
        Ok(out)
    }

    /// Server-sent-event framing of this stream.
    pub fn into_sse(self) -> SseFrames {
        SseFrames { tokens: self, finished: false }
    }
}

impl Iterator for TokenStream {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.events.next() {
            Some(Ok(StreamEvent::Delta(text))) => Some(Ok(text)),
            Some(Ok(StreamEvent::End)) => {
                self.done = true;
                None
            }
            Some(Err(err)) => {
                self.done = true;
                Some(Err(Error::classify("llm", err)))
            }
            None => {
                self.done = true;
                Some(Err(Error::Format("token stream ended without end-of-stream marker".to_string())))
            }
        }
    }
}

pub const SSE_DONE: &str = "data: [DONE]\n\n";

/// `data: {"text": ...}` frames, then `data: [DONE]`. A failure mid-stream
/// becomes a single `data: {"error": ...}` frame before the terminator.
pub struct SseFrames {
    tokens: TokenStream,
    finished: bool,
}

impl Iterator for SseFrames {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.finished {
            return None;
        }
        match self.tokens.next() {
            Some(Ok(text)) => Some(format!("data: {}\n\n", json!({ "text": text }))),
            Some(Err(err)) => {
                tracing::error!(kind = err.kind(), error = %err, "generation stream failed");
                Some(format!("data: {}\n\n", json!({ "error": err.to_string() })))
            }
            None => {
                self.finished = true;
                Some(SSE_DONE.to_string())
            }
        }
    }
}
