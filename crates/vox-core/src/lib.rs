//! Configuration, bootstrap and the orchestrator that ties scanning,
//! embedding and storage into `index` and `search`.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod locks;
pub mod orchestrator;
pub mod report;

pub use config::{Config, ConfigError, resolve_config_path};
pub use error::CoreError;
pub use locks::ProjectLocks;
pub use orchestrator::{AddedDocument, FILE_TREE_KEY, Orchestrator, OrchestratorSettings};
pub use report::{IndexMode, IndexReport, ProjectStats, SearchMode, SearchOutcome, render_context};
