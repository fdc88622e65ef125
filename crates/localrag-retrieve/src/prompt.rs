//! Generation requests for the two answer modes.

use localrag_core::types::GenerationRequest;

const GROUNDED_SYSTEM: &str = "\
You are a helpful information assistant for question-answering tasks.
Use the retrieved context to answer the query while keeping in mind the conversation history.
The context is formatted in the following way: first a page summary, then relevant chunks of content from that page. All chunks are in markdown format.
If you cannot find the answer given the retrieved context and previous assistant messages, apologize to the user and say you don't know.
Use markdown for formatting. Add the most relevant links to pages at the bottom.";

const UNGROUNDED_SYSTEM: &str = "\
You are a helpful information assistant for question-answering tasks, but you don't have any retrieved context information about the user's query.
Respond to the user's query while considering the conversation history.
If you don't know the response given the conversation, apologize to the user and say you don't know.
Use markdown for formatting.";

fn annotated_query(query: &str, rewritten: Option<&str>) -> String {
    match rewritten {
        Some(variant) => format!("{query} ({variant})"),
        None => query.to_string(),
    }
}

/// Answer grounded in `context`.
pub fn grounded_request(context: &str, history: &str, query: &str, rewritten: Option<&str>, max_tokens: u32) -> GenerationRequest {
    GenerationRequest {
        system: GROUNDED_SYSTEM.to_string(),
        user: format!(
            "# Retrieved context:\n\n{context}\n\n# Conversation history:\n\n{history}\n\n# User query: {}\n\n# Structured and concise answer: ",
            annotated_query(query, rewritten)
        ),
        max_tokens: Some(max_tokens),
    }
}

/// Answer from the conversation alone.
pub fn plain_request(history: &str, query: &str, rewritten: Option<&str>, max_tokens: u32) -> GenerationRequest {
    GenerationRequest {
        system: UNGROUNDED_SYSTEM.to_string(),
        user: format!(
            "# Conversation history:\n\n{history}\n\n# User query: {}\n\n# Structured and concise answer: ",
            annotated_query(query, rewritten)
        ),
        max_tokens: Some(max_tokens),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grounded_request_carries_context_and_variant() {
        let req = grounded_request("CTX", "HIST", "fees?", Some("tuition fees"), 16000);
        assert!(req.user.starts_with("# Retrieved context:\n\nCTX\n\n# Conversation history:\n\nHIST"));
        assert!(req.user.contains("# User query: fees? (tuition fees)"));
        assert_eq!(req.max_tokens, Some(16000));
    }

    #[test]
    fn plain_request_has_no_context_section() {
        let req = plain_request("", "hi", None, 8000);
        assert!(!req.user.contains("Retrieved context"));
        assert!(req.user.contains("# User query: hi\n"));
        assert_eq!(req.max_tokens, Some(8000));
    }
}
