//! Conversation in, token stream out.

use std::sync::Arc;

use localrag_core::config::Settings;
use localrag_core::error::{Error, Result};
use localrag_core::stream::TokenStream;
use localrag_core::traits::{ChatModel, QueryRewriter};
use localrag_core::types::{GenerationRequest, Message};

use crate::context::RetrievedContext;
use crate::conversation::ConversationTurn;
use crate::orchestrator::Retriever;
use crate::prompt::{grounded_request, plain_request};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatOptions {
    pub history_limit: usize,
    pub rewrite_count: usize,
    pub answer_max_tokens: u32,
    pub plain_answer_max_tokens: u32,
}

impl ChatOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            history_limit: settings.retrieval.history_limit,
            rewrite_count: settings.retrieval.rewrite_count,
            answer_max_tokens: settings.llm.answer_max_tokens,
            plain_answer_max_tokens: settings.llm.plain_answer_max_tokens,
        }
    }
}

/// Everything decided before generation starts.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedAnswer {
    pub queries: Vec<String>,
    /// `None` when the rewrite judged retrieval unnecessary.
    pub context: Option<RetrievedContext>,
    pub request: GenerationRequest,
}

pub struct ChatService {
    retriever: Retriever,
    rewriter: Arc<dyn QueryRewriter>,
    model: Arc<dyn ChatModel>,
    options: ChatOptions,
}

impl ChatService {
    pub fn new(retriever: Retriever, rewriter: Arc<dyn QueryRewriter>, model: Arc<dyn ChatModel>, options: ChatOptions) -> Self {
        Self { retriever, rewriter, model, options }
    }

    /// Rewrite, retrieve if needed, and build the generation request.
    pub fn prepare(&self, conversation: &[Message]) -> Result<PreparedAnswer> {
        let turn = ConversationTurn::from_messages(conversation, self.options.history_limit)?;
        let rewrite = self
            .rewriter
            .rewrite(&turn.history, &turn.query, self.options.rewrite_count)
            .map_err(|e| Error::classify("llm", e))?;
        let first_variant = rewrite.queries.first().map(String::as_str);

        if !rewrite.retrieval_needed {
            tracing::info!("answering without retrieval");
            let request = plain_request(&turn.history, &turn.query, first_variant, self.options.plain_answer_max_tokens);
            return Ok(PreparedAnswer { queries: rewrite.queries, context: None, request });
        }

        let context = self.retriever.retrieve(&rewrite.queries)?;
        let request = grounded_request(
            &context.render(),
            &turn.history,
            &turn.query,
            first_variant,
            self.options.answer_max_tokens,
        );
        Ok(PreparedAnswer { queries: rewrite.queries, context: Some(context), request })
    }

    /// Answer the last message of `conversation` as a live token stream.
    pub fn respond(&self, conversation: &[Message]) -> Result<TokenStream> {
        self.prepare(conversation)
            .and_then(|prepared| self.model.stream(&prepared.request).map_err(|e| Error::classify("llm", e)))
            .inspect_err(|err| tracing::error!(kind = err.kind(), error = %err, "chat request failed"))
    }
}
