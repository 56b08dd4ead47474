use std::path::PathBuf;

use clap::{Parser, Subcommand};
use vox_core::{IndexMode, SearchMode};
use vox_store::DocumentKind;

/// Project-scoped hybrid retrieval over code symbols and documentation.
#[derive(Debug, Parser)]
#[command(name = "vox", version)]
pub struct Cli {
    /// Config file (TOML). Falls back to `VOX_CONFIG`, then `config/default.toml`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register, inspect and delete projects.
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },
    /// Manage rules, notes and docs attached to a project.
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },
    /// Build the search index.
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },
    /// Hybrid search over indexed items.
    Search {
        query: String,
        /// Restrict to one project.
        #[arg(long, short)]
        project: Option<String>,
        #[arg(long, default_value = "auto")]
        mode: SearchMode,
        /// Results per list.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Documentation and code context for a question, ready for an agent prompt.
    Context {
        question: String,
        #[arg(long, short)]
        project: String,
    },
    /// Signature outline of one file.
    Skeleton {
        #[arg(long, short)]
        project: String,
        /// Path relative to the project root.
        path: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProjectAction {
    /// Register a directory; returns the existing project if already registered.
    Create {
        path: PathBuf,
        #[arg(long)]
        name: Option<String>,
    },
    List,
    /// Delete a project with its documents, index rows and cache.
    Delete { id: String },
    Stats { id: String },
    /// Indented file tree, cached until the next index run.
    Tree {
        id: String,
        #[arg(long)]
        refresh: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum DocsAction {
    /// Store a document and embed it immediately.
    Add {
        #[arg(long, short)]
        project: String,
        #[arg(long = "type", default_value = "note")]
        kind: DocumentKind,
        #[arg(long)]
        title: Option<String>,
        /// Document text. Mutually exclusive with --file.
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        content: Option<String>,
        /// Read the document from this file.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    List {
        #[arg(long, short)]
        project: String,
    },
    Get {
        #[arg(long, short)]
        project: String,
        id: i64,
    },
    Delete {
        #[arg(long, short)]
        project: String,
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
pub enum IndexAction {
    /// Scan, embed and store a project.
    Build {
        id: String,
        #[arg(long, default_value = "all")]
        mode: IndexMode,
        /// Purge the project's index and cache first.
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn index_build_parses_mode_and_force() {
        let cli = Cli::try_parse_from(["vox", "index", "build", "p1", "--mode", "symbolic", "--force"])
            .unwrap();
        match cli.command {
            Command::Index {
                action: IndexAction::Build { id, mode, force },
            } => {
                assert_eq!(id, "p1");
                assert_eq!(mode, IndexMode::Symbolic);
                assert!(force);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn search_defaults_to_auto() {
        let cli = Cli::try_parse_from(["vox", "search", "run_system", "-p", "p1"]).unwrap();
        match cli.command {
            Command::Search { mode, project, .. } => {
                assert_eq!(mode, SearchMode::Auto);
                assert_eq!(project.as_deref(), Some("p1"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn docs_add_needs_exactly_one_source() {
        assert!(Cli::try_parse_from(["vox", "docs", "add", "-p", "p1"]).is_err());
        assert!(
            Cli::try_parse_from([
                "vox", "docs", "add", "-p", "p1", "--content", "x", "--file", "a.md"
            ])
            .is_err()
        );
        let cli = Cli::try_parse_from([
            "vox", "docs", "add", "-p", "p1", "--type", "rule", "--content", "Use tabs.",
        ])
        .unwrap();
        match cli.command {
            Command::Docs {
                action: DocsAction::Add { kind, content, .. },
            } => {
                assert_eq!(kind, DocumentKind::Rule);
                assert_eq!(content.as_deref(), Some("Use tabs."));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_document_type_is_rejected() {
        assert!(
            Cli::try_parse_from(["vox", "docs", "add", "-p", "p", "--type", "memo", "--content", "x"])
                .is_err()
        );
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from(["vox", "project", "list", "--json", "--config", "c.toml"])
            .unwrap();
        assert!(cli.json);
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("c.toml")));
    }
}
