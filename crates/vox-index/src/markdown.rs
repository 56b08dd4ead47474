//! Header-aware prose chunking.
//!
//! Markdown is first cut at `#`, `##` and `###` headings (fenced code blocks
//! are never treated as headings). Every section remembers the stack of
//! headings above it, and is then split with [`TextSplitter`] so no chunk
//! exceeds the configured size.

use vox_store::{IndexableItem, ItemKind};

use crate::splitter::TextSplitter;

const HEADER_KEYS: [&str; 3] = ["H1", "H2", "H3"];

/// A run of lines under one heading, headings included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Heading texts from level 1 to the section's own level. Absent levels are `None`.
    pub headers: [Option<String>; 3],
    pub text: String,
}

impl Section {
    /// Non-empty heading texts joined with `" > "`.
    #[must_use]
    pub fn header_path(&self) -> String {
        self.headers
            .iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" > ")
    }
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim_start();
    // Up to three spaces of indentation still count as a heading.
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let level = trimmed.bytes().take_while(|b| *b == b'#').count();
    if !(1..=3).contains(&level) {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    Some((level, rest.trim().trim_end_matches('#').trim_end()))
}

fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

/// Split markdown into sections at level 1-3 headings.
#[must_use]
pub fn split_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut headers: [Option<String>; 3] = Default::default();
    let mut current = String::new();
    let mut in_fence = false;

    let mut flush = |headers: &[Option<String>; 3], current: &mut String| {
        if !current.trim().is_empty() {
            sections.push(Section {
                headers: headers.clone(),
                text: current.trim_end().to_owned(),
            });
        }
        current.clear();
    };

    for line in text.lines() {
        if is_fence(line) {
            in_fence = !in_fence;
        } else if !in_fence && let Some((level, title)) = heading(line) {
            flush(&headers, &mut current);
            headers[level - 1] = Some(title.to_owned());
            for deeper in &mut headers[level..] {
                *deeper = None;
            }
        }
        current.push_str(line);
        current.push('\n');
    }
    flush(&headers, &mut current);
    sections
}

/// Chunk a prose file into `markdown` items tagged with their header path.
#[must_use]
pub fn chunk_prose(text: &str, rel_path: &str, splitter: &TextSplitter) -> Vec<IndexableItem> {
    let mut items = Vec::new();
    for section in split_sections(text) {
        let header_path = section.header_path();
        for chunk in splitter.split(&section.text) {
            let mut item = IndexableItem::new(ItemKind::Markdown, chunk)
                .with_file_path(rel_path)
                .with_meta("header_path", header_path.clone());
            for (key, header) in HEADER_KEYS.iter().zip(&section.headers) {
                if let Some(header) = header {
                    item = item.with_meta(key, header.clone());
                }
            }
            items.push(item);
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitter::SplitterConfig;

    fn splitter(chunk_size: usize) -> TextSplitter {
        TextSplitter::new(SplitterConfig {
            chunk_size,
            chunk_overlap: 0,
        })
    }

    #[test]
    fn nested_headings_produce_header_paths() {
        let md = "# Title\nContext for H1.\n## Section A\nContext for H2.\n";
        let items = chunk_prose(md, "README.md", &splitter(1000));
        assert!(items.len() >= 2);
        for item in &items {
            assert_eq!(item.kind, ItemKind::Markdown);
            assert_eq!(item.file_path.as_deref(), Some("README.md"));
            assert!(item.metadata.contains_key("header_path"));
        }
        assert_eq!(items[0].metadata["header_path"], "Title");
        assert_eq!(items[0].content, "# Title\nContext for H1.");
        assert_eq!(items[1].metadata["header_path"], "Title > Section A");
        assert_eq!(items[1].metadata["H1"], "Title");
        assert_eq!(items[1].metadata["H2"], "Section A");
    }

    #[test]
    fn sibling_heading_resets_deeper_levels() {
        let md = "# A\n## B\n### C\ntext\n## D\nmore\n";
        let sections = split_sections(md);
        let paths: Vec<String> = sections.iter().map(Section::header_path).collect();
        assert_eq!(paths, vec!["A", "A > B", "A > B > C", "A > D"]);
        assert_eq!(sections[3].headers[2], None);
    }

    #[test]
    fn fenced_hash_lines_are_not_headings() {
        let md = "# Setup\n```sh\n# install deps\nnpm i\n```\nDone.\n";
        let sections = split_sections(md);
        assert_eq!(sections.len(), 1);
        assert!(sections[0].text.contains("# install deps"));
    }

    #[test]
    fn deep_headings_stay_in_their_section() {
        let md = "## Top\n#### Detail\nbody\n";
        let sections = split_sections(md);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].header_path(), "Top");
    }

    #[test]
    fn hashtags_are_not_headings() {
        assert_eq!(heading("#tag"), None);
        assert_eq!(heading("    # indented code"), None);
        assert_eq!(heading("## Closed ##"), Some((2, "Closed")));
    }

    #[test]
    fn preamble_without_heading_has_empty_path() {
        let items = chunk_prose("plain notes\n", "notes.txt", &splitter(100));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].metadata["header_path"], "");
        assert!(!items[0].metadata.contains_key("H1"));
    }

    #[test]
    fn long_sections_are_split_under_the_limit() {
        let body = "word ".repeat(100);
        let md = format!("# Big\n{body}\n");
        let items = chunk_prose(&md, "big.md", &splitter(60));
        assert!(items.len() > 1);
        assert!(items.iter().all(|i| i.content.chars().count() <= 60));
        assert!(items.iter().all(|i| i.metadata["header_path"] == "Big"));
    }

    #[test]
    fn blank_input_yields_nothing() {
        assert!(chunk_prose("\n\n  \n", "empty.md", &splitter(100)).is_empty());
    }
}
