//! localrag-retrieve
//!
//! Query-time pipeline: rank fusion (`fusion`), group-aware reranking
//! (`rerank`), the retrieval orchestrator (`orchestrator`) and the chat
//! service that ties rewrite, retrieval and generation together (`chat`).

pub mod chat;
pub mod context;
pub mod conversation;
pub mod fusion;
pub mod orchestrator;
pub mod prompt;
pub mod rerank;

pub use chat::{ChatOptions, ChatService, PreparedAnswer};
pub use context::RetrievedContext;
pub use conversation::ConversationTurn;
pub use fusion::{fuse, fusion_scores};
pub use orchestrator::Retriever;
pub use rerank::rerank_by_group;
