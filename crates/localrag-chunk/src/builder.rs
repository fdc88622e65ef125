//! Block sequence → token-bounded chunks.
//!
//! A chunk grows block by block from its start index. Once it holds at least
//! [`MIN_TOKENS`], it may end right before a *stopping point*: a block the
//! active [`ToleranceLevel`] accepts as a boundary (a shallow enough heading,
//! a long enough blank run, or a bullet item). If the chunk instead grows past
//! the level's `next_level_threshold`, the scan restarts from the same start
//! index one level looser. The last level never escalates, so every scan ends.

use localrag_core::traits::TokenCounter;
use localrag_core::types::{Block, BlockKind, Chunk};

/// Token floor every chunk but the last must reach.
pub const MIN_TOKENS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToleranceLevel {
    pub size_threshold: usize,
    /// Heading depths that end a chunk at this level.
    pub heading_depths: &'static [u8],
    /// A blank run of at least this many lines ends a chunk.
    pub blank_lines: Option<usize>,
    pub bullet_stop: bool,
    /// Running size at which the scan restarts one level looser.
    pub next_level_threshold: Option<usize>,
}

impl ToleranceLevel {
    pub fn is_stopping_point(&self, block: &Block) -> bool {
        match block.kind {
            BlockKind::Heading => self.heading_depths.contains(&block.level),
            BlockKind::BlankRun => self.blank_lines.is_some_and(|min| block.blank_count >= min),
            BlockKind::Bullet => self.bullet_stop,
            BlockKind::Paragraph => false,
        }
    }
}

pub const TOLERANCE_LEVELS: [ToleranceLevel; 6] = [
    ToleranceLevel { size_threshold: 200, heading_depths: &[1, 2], blank_lines: None, bullet_stop: false, next_level_threshold: Some(300) },
    ToleranceLevel { size_threshold: 300, heading_depths: &[1, 2, 3], blank_lines: None, bullet_stop: false, next_level_threshold: Some(400) },
    ToleranceLevel { size_threshold: 400, heading_depths: &[1, 2, 3, 4], blank_lines: Some(3), bullet_stop: false, next_level_threshold: Some(500) },
    ToleranceLevel { size_threshold: 500, heading_depths: &[1, 2, 3, 4], blank_lines: Some(2), bullet_stop: false, next_level_threshold: Some(600) },
    ToleranceLevel { size_threshold: 600, heading_depths: &[1, 2, 3, 4], blank_lines: Some(2), bullet_stop: true, next_level_threshold: Some(800) },
    ToleranceLevel { size_threshold: 800, heading_depths: &[1, 2, 3, 4], blank_lines: Some(1), bullet_stop: true, next_level_threshold: None },
];

pub struct ChunkBuilder<'a> {
    counter: &'a dyn TokenCounter,
}

impl<'a> ChunkBuilder<'a> {
    pub fn new(counter: &'a dyn TokenCounter) -> Self {
        Self { counter }
    }

    /// Partition `blocks` into chunks. Lossless: the chunks' blocks, in order,
    /// are exactly the input blocks.
    pub fn build(&self, blocks: Vec<Block>) -> Vec<Chunk> {
        let counts: Vec<usize> = blocks.iter().map(|b| self.counter.count(&b.content)).collect();

        let mut ends = Vec::new();
        let mut start = 0;
        while start < blocks.len() {
            let end = self.chunk_end(&blocks, &counts, start);
            ends.push(end);
            start = end;
        }

        let mut chunks = Vec::with_capacity(ends.len());
        let mut remaining = blocks.into_iter();
        let mut start = 0;
        for end in ends {
            chunks.push(Chunk {
                blocks: remaining.by_ref().take(end - start).collect(),
                token_count: counts[start..end].iter().sum(),
            });
            start = end;
        }
        chunks
    }

    /// Exclusive end index of the chunk beginning at `start`.
    fn chunk_end(&self, blocks: &[Block], counts: &[usize], start: usize) -> usize {
        let mut level = 0;
        let mut i = start;
        let mut total = 0;
        while i < blocks.len() {
            let tolerance = &TOLERANCE_LEVELS[level];
            total += counts[i];
            if total >= MIN_TOKENS {
                let before = total - counts[i];
                if i > start && before >= MIN_TOKENS && tolerance.is_stopping_point(&blocks[i]) {
                    return i;
                }
                if let Some(next_threshold) = tolerance.next_level_threshold {
                    if total >= next_threshold {
                        tracing::trace!(start, level = level + 2, "chunk scan escalating tolerance");
                        level += 1;
                        i = start;
                        total = 0;
                        continue;
                    }
                }
            }
            i += 1;
        }
        blocks.len()
    }
}
