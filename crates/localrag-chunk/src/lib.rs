//! localrag-chunk
//!
//! Index-time text processing: markdown is parsed into structural blocks
//! (`block`), the blocks are partitioned into token-bounded chunks
//! (`builder`), and whole directories are turned into page and chunk records
//! (`processor`).

pub mod block;
pub mod builder;
pub mod processor;
pub mod report;
pub mod tokens;

pub use block::parse_blocks;
pub use builder::{ChunkBuilder, ToleranceLevel, MIN_TOKENS, TOLERANCE_LEVELS};
pub use processor::{collapse_blank_lines, DocumentProcessor, PageManifest, ProcessedCorpus};
pub use report::ChunkStats;
pub use tokens::{counter_from_settings, HfTokenCounter, TiktokenCounter};
