//! Size-bounded text splitting with overlap.
//!
//! Text is cut on the coarsest separator present (paragraph, line, word,
//! character); pieces still above the limit are cut again with the next
//! separator. Adjacent pieces are then merged back up to the limit, carrying
//! up to `chunk_overlap` characters of trailing context into the next chunk.

use std::collections::VecDeque;

pub const SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct SplitterConfig {
    /// Upper bound on chunk length, in characters.
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextSplitter {
    config: SplitterConfig,
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

impl TextSplitter {
    /// A zero `chunk_size` is raised to 1 and the overlap clamped below it.
    #[must_use]
    pub fn new(config: SplitterConfig) -> Self {
        let chunk_size = config.chunk_size.max(1);
        let chunk_overlap = config.chunk_overlap.min(chunk_size - 1);
        Self {
            config: SplitterConfig {
                chunk_size,
                chunk_overlap,
            },
        }
    }

    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.config.chunk_size
    }

    /// Split `text` into trimmed, non-empty chunks of at most `chunk_size` chars.
    #[must_use]
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.split_with(text, SEPARATORS)
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let finer = separators.get(position + 1..).unwrap_or(&[]);

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|p| !p.is_empty()).collect()
        };

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();
        for piece in pieces {
            if char_len(piece) <= self.config.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting, separator));
                fitting.clear();
            }
            let next: &[&str] = if finer.is_empty() { &[""] } else { finer };
            chunks.extend(self.split_with(piece, next));
        }
        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting, separator));
        }
        chunks
    }

    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let limit = self.config.chunk_size;
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            let joined = |window: &VecDeque<&str>| if window.is_empty() { 0 } else { sep_len };

            if !window.is_empty() && total + joined(&window) + len > limit {
                push_joined(&mut chunks, &window, separator);
                // Keep a tail of the window as overlap, small enough for `piece` to fit.
                while !window.is_empty()
                    && (total > self.config.chunk_overlap
                        || total + joined(&window) + len > limit)
                {
                    let dropped = window.pop_front().map_or(0, char_len);
                    total -= dropped + if window.is_empty() { 0 } else { sep_len };
                }
            }
            total += joined(&window) + len;
            window.push_back(piece);
        }
        push_joined(&mut chunks, &window, separator);
        chunks
    }
}

fn push_joined(chunks: &mut Vec<String>, window: &VecDeque<&str>, separator: &str) {
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn splitter(chunk_size: usize, chunk_overlap: usize) -> TextSplitter {
        TextSplitter::new(SplitterConfig {
            chunk_size,
            chunk_overlap,
        })
    }

    #[test]
    fn empty_and_blank_text() {
        assert!(splitter(10, 2).split("").is_empty());
        assert!(splitter(10, 2).split(" \n\n ").is_empty());
    }

    #[test]
    fn small_text_is_one_chunk() {
        assert_eq!(splitter(100, 10).split("Hello world."), vec!["Hello world."]);
    }

    #[test]
    fn paragraphs_split_before_lines() {
        let text = "alpha beta\ngamma\n\ndelta epsilon";
        let chunks = splitter(18, 0).split(text);
        assert_eq!(chunks, vec!["alpha beta\ngamma", "delta epsilon"]);
    }

    #[test]
    fn words_overlap_between_chunks() {
        let text = "one two three four five six seven eight";
        let chunks = splitter(14, 6).split(text);
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let last_word = pair[0].split(' ').next_back().unwrap();
            assert!(pair[1].starts_with(last_word), "{pair:?}");
        }
    }

    #[test]
    fn unbroken_text_falls_back_to_characters() {
        let text = "x".repeat(25);
        let chunks = splitter(10, 3).split(&text);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks[0], "x".repeat(10));
        assert!(chunks.len() >= 3);
    }

    #[test]
    fn multibyte_characters_are_counted_not_bytes() {
        let text = "ü".repeat(12);
        let chunks = splitter(5, 0).split(&text);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 5);
    }

    #[test]
    fn overlap_is_clamped_below_size() {
        let s = splitter(4, 10);
        let chunks = s.split("a b c d e f g h");
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
    }

    proptest! {
        #[test]
        fn chunks_never_exceed_size(
            text in "[a-z \\n]{0,400}",
            size in 1usize..60,
            overlap in 0usize..30,
        ) {
            let s = splitter(size, overlap);
            for chunk in s.split(&text) {
                prop_assert!(chunk.chars().count() <= s.chunk_size());
                prop_assert!(!chunk.trim().is_empty());
            }
        }

        #[test]
        fn every_word_survives(text in "[a-z]{1,8}( [a-z]{1,8}){0,40}", size in 8usize..40) {
            let chunks = splitter(size, 0).split(&text);
            let joined = chunks.join(" ");
            for word in text.split(' ') {
                prop_assert!(joined.contains(word));
            }
        }
    }
}
