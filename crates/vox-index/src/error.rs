//! Error types for vox-index.

use std::path::PathBuf;

/// Errors raised while scanning a project tree.
///
/// Per-file variants are logged and the file skipped; only
/// [`ScanError::NotADirectory`] aborts a scan.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The file could not be read (missing, unreadable, not UTF-8).
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Tree-sitter could not produce a syntax tree.
    #[error("cannot parse {path}: {message}")]
    Parse { path: String, message: String },

    /// No grammar compiled in for this language.
    #[error("no grammar available for {0}")]
    NoGrammar(&'static str),

    #[error("{path} is {bytes} bytes, above the {limit} byte limit")]
    TooLarge {
        path: PathBuf,
        bytes: u64,
        limit: u64,
    },

    #[error("scan root {0} is not a directory")]
    NotADirectory(PathBuf),
}

/// Result type alias using `ScanError`.
pub type Result<T> = std::result::Result<T, ScanError>;
