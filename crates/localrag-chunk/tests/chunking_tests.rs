use proptest::prelude::*;

use localrag_chunk::{parse_blocks, ChunkBuilder, MIN_TOKENS};
use localrag_core::traits::TokenCounter;
use localrag_core::types::Block;

struct Words;
impl TokenCounter for Words {
    fn count(&self, text: &str) -> usize { text.split_whitespace().count() }
}

fn line() -> impl Strategy<Value = String> {
    prop_oneof![
        (1usize..=7, 1usize..4).prop_map(|(depth, words)| format!("{} {}", "#".repeat(depth), vec!["title"; words].join(" "))),
        (1usize..90).prop_map(|words| vec!["word"; words].join(" ")),
        Just(String::new()),
        Just("   ".to_string()),
        (1usize..12).prop_map(|words| format!("* {}", vec!["item"; words].join(" "))),
    ]
}

fn document() -> impl Strategy<Value = String> {
    prop::collection::vec(line(), 0..250).prop_map(|lines| lines.join("\n"))
}

proptest! {
    #[test]
    fn chunking_is_lossless(text in document()) {
        let blocks = parse_blocks(&text);
        let chunks = ChunkBuilder::new(&Words).build(blocks.clone());
        let rebuilt: Vec<Block> = chunks.iter().flat_map(|c| c.blocks.iter().cloned()).collect();
        prop_assert_eq!(rebuilt, blocks);
        prop_assert!(chunks.iter().all(|c| !c.blocks.is_empty()));
    }

    #[test]
    fn only_the_last_chunk_may_fall_under_the_floor(text in document()) {
        let chunks = ChunkBuilder::new(&Words).build(parse_blocks(&text));
        if let Some((_, init)) = chunks.split_last() {
            for chunk in init {
                prop_assert!(chunk.token_count >= MIN_TOKENS, "chunk of {} tokens", chunk.token_count);
            }
        }
    }

    #[test]
    fn token_count_is_the_sum_of_block_counts(text in document()) {
        for chunk in ChunkBuilder::new(&Words).build(parse_blocks(&text)) {
            let expected: usize = chunk.blocks.iter().map(|b| Words.count(&b.content)).sum();
            prop_assert_eq!(chunk.token_count, expected);
        }
    }

    #[test]
    fn rendered_blocks_reproduce_the_source_lines(text in document()) {
        let rendered: String = parse_blocks(&text).iter().map(|b| format!("{}\n", b.content)).collect();
        prop_assert_eq!(rendered.strip_suffix('\n').unwrap_or(&rendered), text.as_str());
    }
}

#[test]
fn empty_document_yields_zero_chunks() {
    assert!(ChunkBuilder::new(&Words).build(parse_blocks("")).is_empty());
}
