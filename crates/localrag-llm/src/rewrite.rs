//! Structured query rewrite: one chat completion constrained by a JSON schema
//! with `retrieval_needed` and `rewritten_query_1..=n`.

use anyhow::Result;
use serde_json::{json, Map, Value};

use localrag_core::error::Error;
use localrag_core::traits::QueryRewriter;
use localrag_core::types::QueryRewrite;

use crate::client::OpenAiClient;

const REWRITE_PROMPT: &str = "\
Your purpose is to analyze a conversation between an assistant and a user, determine if it requires retrieval, \
and rewrite the user's latest query for retrieval augmented generation purposes.
Retrieval is unnecessary only if you're certain there cannot be any relevant context retrieved to help the assistant answer the query.
Create {count} versions of the rewritten query.
Follow these rules:
Omit articles (a, an, the) and transitions.
Generate single-line plain text without any special characters, formatting, or newlines.
Include specific terminology.";

fn query_key(i: usize) -> String {
    format!("rewritten_query_{i}")
}

/// Strict `response_format` for `count` rewritten queries.
pub fn rewrite_schema(count: usize) -> Value {
    let mut properties = Map::new();
    properties.insert("retrieval_needed".into(), json!({ "type": "boolean" }));
    let mut required = vec![Value::from("retrieval_needed")];
    for i in 1..=count {
        properties.insert(query_key(i), json!({ "type": "string" }));
        required.push(Value::from(query_key(i)));
    }
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "query_rewrite_schema",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": properties,
                "required": required,
                "additionalProperties": false,
            },
        },
    })
}

pub fn rewrite_request_body(model: &str, max_tokens: u32, history: &str, query: &str, count: usize) -> Value {
    json!({
        "model": model,
        "max_tokens": max_tokens,
        "messages": [
            { "role": "system", "content": REWRITE_PROMPT.replace("{count}", &count.to_string()) },
            { "role": "user", "content": format!("Conversation history:\n{history}\nUser query: {query}\n") },
        ],
        "response_format": rewrite_schema(count),
    })
}

/// Decode the structured rewrite. A missing `retrieval_needed` reads as
/// `false`; every `rewritten_query_i` up to `count` must be a string.
pub fn parse_rewrite(content: &str, count: usize) -> Result<QueryRewrite> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| Error::Format(format!("rewrite output is not JSON: {e}")))?;
    let object = value.as_object().ok_or_else(|| Error::Format("rewrite output is not a JSON object".into()))?;
    let retrieval_needed = match object.get("retrieval_needed") {
        None => false,
        Some(v) => v.as_bool().ok_or_else(|| Error::Format("retrieval_needed is not a boolean".into()))?,
    };
    let queries = (1..=count)
        .map(|i| {
            let key = query_key(i);
            object
                .get(&key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| Error::Format(format!("{key} missing or not a string")))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(QueryRewrite { retrieval_needed, queries })
}

fn message_content(response: &Value) -> Result<&str> {
    response
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Format("completion has no message content".into()).into())
}

impl QueryRewriter for OpenAiClient {
    fn rewrite(&self, history: &str, query: &str, count: usize) -> Result<QueryRewrite> {
        let body = rewrite_request_body(&self.llm.rewrite_model, self.llm.rewrite_max_tokens, history, query, count);
        let response = self.post_json("/chat/completions", &body)?;
        let rewrite = parse_rewrite(message_content(&response)?, count)?;
        tracing::info!(retrieval_needed = rewrite.retrieval_needed, queries = ?rewrite.queries, "query rewritten");
        Ok(rewrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_format(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<Error>(), Some(Error::Format(_)))
    }

    #[test]
    fn schema_requires_every_query() {
        let schema = rewrite_schema(3);
        let inner = &schema["json_schema"]["schema"];
        assert_eq!(schema["json_schema"]["strict"], true);
        assert_eq!(inner["required"].as_array().map(Vec::len), Some(4));
        assert_eq!(inner["properties"]["rewritten_query_3"]["type"], "string");
        assert_eq!(inner["additionalProperties"], false);
    }

    #[test]
    fn parses_complete_output() {
        let out = r#"{"retrieval_needed":true,"rewritten_query_1":"fees","rewritten_query_2":"tuition"}"#;
        let rewrite = parse_rewrite(out, 2).expect("parse");
        assert!(rewrite.retrieval_needed);
        assert_eq!(rewrite.queries, vec!["fees", "tuition"]);
    }

    #[test]
    fn missing_flag_means_no_retrieval() {
        let rewrite = parse_rewrite(r#"{"rewritten_query_1":"hello"}"#, 1).expect("parse");
        assert!(!rewrite.retrieval_needed);
    }

    #[test]
    fn missing_or_non_string_query_is_a_format_error() {
        assert!(is_format(&parse_rewrite(r#"{"retrieval_needed":true,"rewritten_query_1":"a"}"#, 2).expect_err("missing")));
        assert!(is_format(&parse_rewrite(r#"{"retrieval_needed":true,"rewritten_query_1":7}"#, 1).expect_err("number")));
    }

    #[test]
    fn non_json_is_a_format_error() {
        assert!(is_format(&parse_rewrite("Sure! Here are your queries", 1).expect_err("prose")));
        assert!(is_format(&parse_rewrite("[1,2]", 1).expect_err("array")));
    }

    #[test]
    fn request_embeds_history_and_count() {
        let body = rewrite_request_body("gpt-4o", 8000, "**User:** hi", "fees?", 3);
        let system = body["messages"][0]["content"].as_str().unwrap_or_default();
        assert!(system.contains("Create 3 versions"));
        assert_eq!(body["messages"][1]["content"], "Conversation history:\n**User:** hi\nUser query: fees?\n");
        assert_eq!(body["max_tokens"], 8000);
    }
}
