use super::types::ContentBlock;
use crate::richtext;

pub const WORDS_PER_MINUTE: usize = 200;

/// Estimated minutes to read: heading and body words across all blocks at
/// 200 words per minute, rounded up once over the total. An empty post
/// reads in zero minutes.
pub fn estimate(blocks: &[ContentBlock]) -> u32 {
    let words: usize = blocks
        .iter()
        .map(|block| word_count(&block.heading) + word_count(&richtext::as_text(&block.body)))
        .sum();

    words.div_ceil(WORDS_PER_MINUTE) as u32
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
