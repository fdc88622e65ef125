//! Server-sent-event decoding for streamed chat completions.

use anyhow::Result;
use serde_json::Value;
use std::io::BufRead;

use localrag_core::error::Error;
use localrag_core::stream::StreamEvent;

/// Decode one SSE line. Comments, blank lines, non-`data` fields and deltas
/// without text yield `None`.
pub fn parse_sse_line(line: &str) -> Result<Option<StreamEvent>> {
    let Some(data) = line.trim_end_matches(['\r', '\n']).strip_prefix("data:") else {
        return Ok(None);
    };
    let data = data.trim();
    if data.is_empty() {
        return Ok(None);
    }
    if data == "[DONE]" {
        return Ok(Some(StreamEvent::End));
    }
    let value: Value = serde_json::from_str(data).map_err(|e| Error::Format(format!("stream chunk is not JSON: {e}")))?;
    if let Some(err) = value.get("error") {
        let message = err.get("message").and_then(Value::as_str).map_or_else(|| err.to_string(), str::to_string);
        return Err(Error::service("llm", message).into());
    }
    let delta = value
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("delta"))
        .and_then(|d| d.get("content"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty());
    Ok(delta.map(|s| StreamEvent::Delta(s.to_string())))
}

/// Events from an SSE body, one line at a time. Ends when the body ends; the
/// `[DONE]` marker is passed through as [`StreamEvent::End`].
pub struct SseEvents<R> {
    lines: std::io::Lines<R>,
}

impl<R: BufRead> SseEvents<R> {
    pub fn new(reader: R) -> Self {
        Self { lines: reader.lines() }
    }
}

impl<R: BufRead> Iterator for SseEvents<R> {
    type Item = Result<StreamEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            match parse_sse_line(&line) {
                Ok(Some(event)) => return Some(Ok(event)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
