//! Operation results and their plain-text renderings.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use vox_store::{ItemKind, Project, SearchResult};

/// Which item families an index run embeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexMode {
    #[default]
    All,
    /// Code symbols only.
    Symbolic,
    /// Prose chunks and registered documents only.
    Semantic,
}

impl IndexMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Symbolic => "symbolic",
            Self::Semantic => "semantic",
        }
    }

    #[must_use]
    pub fn includes_symbols(self) -> bool {
        matches!(self, Self::All | Self::Symbolic)
    }

    #[must_use]
    pub fn includes_text(self) -> bool {
        matches!(self, Self::All | Self::Semantic)
    }
}

impl fmt::Display for IndexMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "symbolic" => Ok(Self::Symbolic),
            "semantic" => Ok(Self::Semantic),
            other => Err(format!(
                "unknown index mode {other:?} (expected all, symbolic or semantic)"
            )),
        }
    }
}

/// Which result lists a search returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Both lists, each under its own heading.
    #[default]
    Auto,
    Symbolic,
    Semantic,
}

impl SearchMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Symbolic => "symbolic",
            Self::Semantic => "semantic",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "symbolic" => Ok(Self::Symbolic),
            "semantic" => Ok(Self::Semantic),
            other => Err(format!(
                "unknown search mode {other:?} (expected auto, symbolic or semantic)"
            )),
        }
    }
}

/// Summary of an index run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexReport {
    pub project_id: String,
    pub mode: IndexMode,
    pub forced: bool,
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub symbols_indexed: usize,
    pub chunks_indexed: usize,
    pub documents_indexed: usize,
    pub duration_ms: u64,
}

impl IndexReport {
    #[must_use]
    pub fn items_indexed(&self) -> usize {
        self.symbols_indexed + self.chunks_indexed + self.documents_indexed
    }
}

impl fmt::Display for IndexReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Indexed project {} (mode: {}{})",
            self.project_id,
            self.mode,
            if self.forced { ", forced" } else { "" }
        )?;
        writeln!(
            f,
            "  files: {} scanned, {} skipped",
            self.files_scanned, self.files_skipped
        )?;
        writeln!(
            f,
            "  items: {} symbols, {} chunks, {} documents",
            self.symbols_indexed, self.chunks_indexed, self.documents_indexed
        )?;
        write!(f, "  took {} ms", self.duration_ms)
    }
}

/// Result lists of one search. A list is `None` when the mode did not ask for it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchOutcome {
    pub text: Option<Vec<SearchResult>>,
    pub symbols: Option<Vec<SearchResult>>,
}

fn write_results(f: &mut fmt::Formatter<'_>, results: &[SearchResult]) -> fmt::Result {
    if results.is_empty() {
        return writeln!(f, "No results.");
    }
    for (i, r) in results.iter().enumerate() {
        writeln!(
            f,
            "[{}] {} ({}, relevance {:.3})",
            i + 1,
            r.source,
            r.kind,
            r.relevance
        )?;
        writeln!(f, "{}", r.content.trim_end())?;
        writeln!(f)?;
    }
    Ok(())
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = &self.text {
            writeln!(f, "=== Text/Docs ===")?;
            write_results(f, text)?;
        }
        if let Some(symbols) = &self.symbols {
            if self.text.is_some() {
                writeln!(f)?;
            }
            writeln!(f, "=== Code/Symbols ===")?;
            write_results(f, symbols)?;
        }
        Ok(())
    }
}

/// Agent-facing context block built from both result lists.
#[must_use]
pub fn render_context(outcome: &SearchOutcome) -> String {
    let section = |results: Option<&Vec<SearchResult>>| -> String {
        let results = results.map(Vec::as_slice).unwrap_or_default();
        if results.is_empty() {
            return "(nothing relevant found)\n".to_owned();
        }
        results
            .iter()
            .map(|r| format!("[{}]\n{}\n", r.source, r.content.trim_end()))
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!(
        "### DOCUMENTATION / NOTES\n{}\n---\n### CODE SYMBOLS\n{}",
        section(outcome.text.as_ref()),
        section(outcome.symbols.as_ref())
    )
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectStats {
    pub project: Project,
    pub documents: u64,
    /// Stored items per type, in [`ItemKind::ALL`] order.
    pub items: Vec<(ItemKind, u64)>,
    pub cache_entries: u64,
}

impl ProjectStats {
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|(_, n)| n).sum()
    }
}

impl fmt::Display for ProjectStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Project {} ({})", self.project.name, self.project.id)?;
        writeln!(f, "  path: {}", self.project.path)?;
        writeln!(f, "  documents: {}", self.documents)?;
        writeln!(f, "  indexed items: {}", self.total_items())?;
        for (kind, count) in &self.items {
            writeln!(f, "    {kind}: {count}")?;
        }
        write!(f, "  cache entries: {}", self.cache_entries)
    }
}
