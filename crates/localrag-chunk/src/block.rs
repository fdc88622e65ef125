//! Markdown → block sequence.

use localrag_core::types::Block;

/// Split `text` into headings, paragraphs, blank-line runs and bullet items.
///
/// Any line starting with `*` once trimmed is a bullet item, which covers
/// `* item` lists as well as `**Label:** value` lines from converted HTML.
/// `-` and `+` lines stay paragraph text.
///
/// Blocks keep their source lines verbatim (leading indentation included), so
/// rendering every block followed by `\n` reproduces the input line by line.
pub fn parse_blocks(text: &str) -> Vec<Block> {
    if text.is_empty() {
        return Vec::new();
    }
    let lines: Vec<&str> = text.split('\n').collect();
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim();
        if let Some(level) = heading_level(trimmed) {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(Block::heading(level, line));
        } else if trimmed.is_empty() {
            flush_paragraph(&mut paragraph, &mut blocks);
            let run_end = lines[i..]
                .iter()
                .position(|l| !l.trim().is_empty())
                .map_or(lines.len(), |offset| i + offset);
            blocks.push(Block::blank_run(&lines[i..run_end]));
            i = run_end;
            continue;
        } else if trimmed.starts_with('*') {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(Block::bullet(line));
        } else {
            paragraph.push(line);
        }
        i += 1;
    }
    flush_paragraph(&mut paragraph, &mut blocks);
    blocks
}

fn flush_paragraph(lines: &mut Vec<&str>, blocks: &mut Vec<Block>) {
    if !lines.is_empty() {
        blocks.push(Block::paragraph(lines.join("\n")));
        lines.clear();
    }
}

/// `#` to `######` followed by whitespace.
fn heading_level(trimmed: &str) -> Option<u8> {
    let hashes = trimmed.bytes().take_while(|b| *b == b'#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let after = &trimmed[hashes..];
    if after.starts_with(char::is_whitespace) {
        u8::try_from(hashes).ok()
    } else {
        None
    }
}
