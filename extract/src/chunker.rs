//! Text chunking for embedding (§4.B "Chunking").
//!
//! The teacher's chunker slides a tokenizer-token window over text
//! using a HuggingFace `Tokenizer`; this one keeps the same
//! sliding-window-with-stride shape but counts whitespace-delimited
//! words instead of subword tokens, since nothing downstream owns a
//! model-specific vocabulary.

use ingest_model::Chunk;

/// Window size and stride, in whitespace-delimited words.
#[derive(Debug, Clone, Copy)]
pub struct ChunkerConfig {
    pub window: usize,
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self { window: 512, overlap: 50 }
    }
}

/// Split `text` into overlapping chunks per `config` (§4.B: window W,
/// overlap O, stride W−O; last window holds whatever remains).
///
/// Returns one chunk for empty input's absence of tokens (the pipeline
/// treats zero tokens as the "empty" outcome before this is ever
/// called, so this function itself just returns an empty vec for `""`).
pub fn chunk(text: &str, config: &ChunkerConfig) -> Vec<Chunk> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let window = config.window.max(1);
    let stride = window.saturating_sub(config.overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut index = 0;
    loop {
        let end = (start + window).min(words.len());
        chunks.push(Chunk::new(index, words[start..end].join(" ")));
        index += 1;
        if end >= words.len() {
            break;
        }
        start += stride;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk("", &ChunkerConfig::default()).is_empty());
    }

    #[test]
    fn single_word_yields_one_chunk() {
        let chunks = chunk("hello", &ChunkerConfig::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "hello");
    }

    #[test]
    fn exactly_window_tokens_yields_one_chunk() {
        let config = ChunkerConfig { window: 512, overlap: 50 };
        let chunks = chunk(&words(512), &config);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn window_plus_one_yields_two_chunks_with_overlap_plus_one() {
        let config = ChunkerConfig { window: 512, overlap: 50 };
        let chunks = chunk(&words(513), &config);
        assert_eq!(chunks.len(), 2);
        let second_word_count = chunks[1].text.split_whitespace().count();
        assert_eq!(second_word_count, 51);
    }

    #[test]
    fn chunks_are_sequentially_indexed() {
        let config = ChunkerConfig { window: 10, overlap: 2 };
        let chunks = chunk(&words(100), &config);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_index, i);
        }
    }

    #[test]
    fn successive_chunks_overlap_by_configured_amount() {
        let config = ChunkerConfig { window: 10, overlap: 3 };
        let chunks = chunk(&words(30), &config);
        for pair in chunks.windows(2) {
            let prev_words: Vec<&str> = pair[0].text.split_whitespace().collect();
            let next_words: Vec<&str> = pair[1].text.split_whitespace().collect();
            let prev_tail = &prev_words[prev_words.len() - 3..];
            let next_head = &next_words[..3];
            assert_eq!(prev_tail, next_head);
        }
    }

    #[test]
    fn covers_every_token_at_least_once() {
        let config = ChunkerConfig { window: 7, overlap: 2 };
        let total = 40;
        let chunks = chunk(&words(total), &config);
        let mut covered = vec![false; total];
        let mut idx = 0usize;
        for c in &chunks {
            for w in c.text.split_whitespace() {
                let n: usize = w.trim_start_matches('w').parse().expect("numeric token");
                covered[n] = true;
            }
            idx += 1;
        }
        assert!(idx > 0);
        assert!(covered.iter().all(|&c| c));
    }

    #[test]
    fn chunk_count_matches_formula() {
        // chunks = ceil(max(T-O,1) / (W-O)), special-cased to 1 when T <= W.
        let config = ChunkerConfig { window: 10, overlap: 4 };
        for total in [1usize, 10, 11, 20, 23] {
            let chunks = chunk(&words(total), &config);
            let expected = if total <= config.window {
                1
            } else {
                let numerator = (total - config.overlap).max(1);
                let stride = config.window - config.overlap;
                numerator.div_ceil(stride)
            };
            assert_eq!(chunks.len(), expected, "total={total}");
        }
    }
}
