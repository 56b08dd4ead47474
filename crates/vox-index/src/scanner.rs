//! Project walk: directory filtering, per-extension dispatch and item collection.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use vox_store::{IndexableItem, ItemKind};

use crate::error::{Result, ScanError};
use crate::languages::is_prose;
use crate::markdown::chunk_prose;
use crate::registry::ExtractorRegistry;
use crate::splitter::{SplitterConfig, TextSplitter};

/// Directory names skipped by default, together with their whole subtree.
pub const DEFAULT_IGNORE_DIRS: &[&str] = &[
    "node_modules",
    ".next",
    "dist",
    "build",
    "target",
    "venv",
    ".venv",
    "__pycache__",
    ".git",
    "vendor",
    "staticfiles",
    "static",
    "public",
    "assets",
    "locales",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub ignore_dirs: Vec<String>,
    /// Directories whose name starts with this prefix are skipped. Empty disables the rule.
    pub reserved_prefix: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub max_file_bytes: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            ignore_dirs: DEFAULT_IGNORE_DIRS.iter().map(|d| (*d).to_owned()).collect(),
            reserved_prefix: ".".into(),
            chunk_size: 1000,
            chunk_overlap: 200,
            max_file_bytes: 1024 * 1024,
        }
    }
}

/// Items produced by one scan plus counters for reporting.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub items: Vec<IndexableItem>,
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub symbols: usize,
    pub chunks: usize,
}

impl ScanOutcome {
    /// Symbol items and text items, in scan order.
    #[must_use]
    pub fn partition(self) -> (Vec<IndexableItem>, Vec<IndexableItem>) {
        self.items
            .into_iter()
            .partition(|item| item.kind == ItemKind::Symbol)
    }
}

/// Build a walker over `root` that prunes ignored and reserved directories.
///
/// `.gitignore` files are not consulted; only the configured names apply.
pub(crate) fn project_walker(root: &Path, config: &ScannerConfig) -> ignore::Walk {
    let ignored: Arc<HashSet<String>> = Arc::new(config.ignore_dirs.iter().cloned().collect());
    let prefix = config.reserved_prefix.clone();
    ignore::WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| {
            if entry.depth() == 0 || !entry.file_type().is_some_and(|ft| ft.is_dir()) {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !(ignored.contains(name.as_ref()) || (!prefix.is_empty() && name.starts_with(&prefix)))
        })
        .build()
}

/// `path` relative to `root`, with `/` separators on every platform.
pub(crate) fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Walks a project and turns its files into unembedded [`IndexableItem`]s.
#[derive(Debug, Clone)]
pub struct SourceScanner {
    config: ScannerConfig,
    registry: ExtractorRegistry,
    splitter: TextSplitter,
}

impl SourceScanner {
    /// Scanner with every compiled-in grammar registered.
    #[must_use]
    pub fn new(config: ScannerConfig) -> Self {
        Self::with_registry(config, ExtractorRegistry::with_defaults())
    }

    #[must_use]
    pub fn with_registry(config: ScannerConfig, registry: ExtractorRegistry) -> Self {
        let splitter = TextSplitter::new(SplitterConfig {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        });
        Self {
            config,
            registry,
            splitter,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Scan every recognised file under `root`.
    ///
    /// Files that cannot be read or parsed are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::NotADirectory`] if `root` is not a directory.
    pub fn scan(&self, root: &Path) -> Result<ScanOutcome> {
        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }

        let files: Vec<PathBuf> = project_walker(root, &self.config)
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(error = %e, "walk error, skipping entry");
                    None
                }
            })
            .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
            .map(ignore::DirEntry::into_path)
            .filter(|p| self.registry.for_path(p).is_some() || is_prose(p))
            .collect();

        let total = files.len();
        tracing::info!(root = %root.display(), total, "scan started");

        let mut outcome = ScanOutcome::default();
        for (i, path) in files.iter().enumerate() {
            let rel = relative_path(root, path);
            outcome.files_scanned += 1;
            match self.scan_file(path, &rel) {
                Ok(items) => {
                    let symbols = items.iter().filter(|i| i.kind == ItemKind::Symbol).count();
                    outcome.symbols += symbols;
                    outcome.chunks += items.len() - symbols;
                    tracing::debug!(
                        file = %rel,
                        progress = format_args!("{}/{total}", i + 1),
                        items = items.len(),
                    );
                    outcome.items.extend(items);
                }
                Err(e) => {
                    outcome.files_skipped += 1;
                    tracing::warn!(file = %rel, error = %e, "skipping file");
                }
            }
        }

        tracing::info!(
            files = outcome.files_scanned,
            skipped = outcome.files_skipped,
            symbols = outcome.symbols,
            chunks = outcome.chunks,
            "scan finished"
        );
        Ok(outcome)
    }

    /// Read and convert one file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is too large, unreadable, or unparsable.
    pub fn scan_file(&self, path: &Path, rel: &str) -> Result<Vec<IndexableItem>> {
        let io_err = |source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        };
        let bytes = std::fs::metadata(path).map_err(io_err)?.len();
        if bytes > self.config.max_file_bytes {
            return Err(ScanError::TooLarge {
                path: path.to_path_buf(),
                bytes,
                limit: self.config.max_file_bytes,
            });
        }
        let source = std::fs::read_to_string(path).map_err(io_err)?;

        if let Some(extractor) = self.registry.for_path(path) {
            let symbols = extractor.extract(&source, rel)?;
            return Ok(symbols.iter().map(crate::Symbol::to_item).collect());
        }
        Ok(chunk_prose(&source, rel, &self.splitter))
    }
}
