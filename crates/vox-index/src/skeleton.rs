//! Signature-only outlines of source files.

use std::fmt::Write;
use std::path::Path;

use crate::registry::ExtractorRegistry;
use crate::symbol::Symbol;

/// Lines shown for files without an extractor.
pub const HEAD_LINES: usize = 50;

const INDENT: &str = "    ";

/// Outline `source`: one signature line per symbol, nested by line range,
/// with docstrings under their symbol.
///
/// Files with no extractor, no symbols, or a failed parse fall back to the
/// first [`HEAD_LINES`] lines.
#[must_use]
pub fn file_skeleton(source: &str, rel_path: &str, registry: &ExtractorRegistry) -> String {
    let symbols = match registry.for_path(Path::new(rel_path)) {
        Some(extractor) => match extractor.extract(source, rel_path) {
            Ok(symbols) => symbols,
            Err(e) => {
                tracing::warn!(file = rel_path, error = %e, "skeleton falling back to head");
                Vec::new()
            }
        },
        None => Vec::new(),
    };
    if symbols.is_empty() {
        return head(source);
    }
    outline(&symbols)
}

fn head(source: &str) -> String {
    let mut lines = source.lines();
    let mut out = lines
        .by_ref()
        .take(HEAD_LINES)
        .collect::<Vec<_>>()
        .join("\n");
    if lines.next().is_some() {
        out.push_str("\n... (truncated)");
    }
    out
}

fn outline(symbols: &[Symbol]) -> String {
    let mut out = String::new();
    // (start, end) of symbols still open at the current position.
    let mut open: Vec<(usize, usize)> = Vec::new();
    for symbol in symbols {
        while open
            .last()
            .is_some_and(|&(start, end)| symbol.start_line < start || symbol.end_line > end)
        {
            open.pop();
        }
        let depth = INDENT.repeat(open.len());
        let signature = symbol.code.lines().next().unwrap_or_default().trim();
        let _ = writeln!(out, "{depth}{signature}");
        if let Some(doc) = &symbol.docstring {
            let _ = writeln!(out, "{depth}{INDENT}\"\"\"{doc}\"\"\"");
        }
        open.push((symbol.start_line, symbol.end_line));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "lang-python")]
    #[test]
    fn python_outline_nests_methods_and_docstrings() {
        let src = "\
class Agent:
    \"\"\"Thinks.\"\"\"

    def think(self, topic):
        return topic

def run_system():
    pass
";
        let out = file_skeleton(src, "agent.py", &ExtractorRegistry::with_defaults());
        assert_eq!(
            out,
            "class Agent:\n    \"\"\"Thinks.\"\"\"\n    def think(self, topic):\ndef run_system():\n"
        );
    }

    #[cfg(feature = "lang-rust")]
    #[test]
    fn rust_outline_keeps_impl_methods_indented() {
        let src = "pub struct Point {\n    x: i32,\n}\n\nfn origin() -> Point {\n    Point { x: 0 }\n}\n\nmod geo {\n    pub fn area() -> f64 {\n        0.0\n    }\n}\n";
        let out = file_skeleton(src, "src/lib.rs", &ExtractorRegistry::with_defaults());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            [
                "pub struct Point {",
                "fn origin() -> Point {",
                "mod geo {",
                "    pub fn area() -> f64 {",
            ]
        );
    }

    #[test]
    fn unknown_files_show_head() {
        let src = "line one\nline two\n";
        let out = file_skeleton(src, "notes.txt", &ExtractorRegistry::new());
        assert_eq!(out, "line one\nline two");
    }

    #[test]
    fn long_unknown_files_are_truncated() {
        let src: String = (1..=80).map(|i| format!("row {i}\n")).collect();
        let out = file_skeleton(&src, "data.cfg", &ExtractorRegistry::new());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), HEAD_LINES + 1);
        assert_eq!(lines[HEAD_LINES - 1], "row 50");
        assert_eq!(lines[HEAD_LINES], "... (truncated)");
    }

    #[test]
    fn exactly_head_lines_is_not_truncated() {
        let src: String = (1..=HEAD_LINES).map(|i| format!("row {i}\n")).collect();
        let out = file_skeleton(&src, "data.cfg", &ExtractorRegistry::new());
        assert!(!out.contains("truncated"));
    }
}
