use std::path::PathBuf;

use vox_embed::EmbedError;
use vox_index::ScanError;
use vox_store::{DocumentId, StoreError};

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("unknown project: {0}")]
    UnknownProject(String),

    #[error("path not found: {}", path.display())]
    PathNotFound { path: PathBuf },

    #[error("document {id} not found in project {project_id}")]
    UnknownDocument { project_id: String, id: DocumentId },

    #[error("embedding failed for project {project_id}: {source}")]
    Embedding {
        project_id: String,
        #[source]
        source: EmbedError,
    },

    #[error("storage error for project {project_id}: {source}")]
    Storage {
        project_id: String,
        #[source]
        source: StoreError,
    },

    #[error("scan of project {project_id} failed: {source}")]
    Scan {
        project_id: String,
        #[source]
        source: ScanError,
    },

    #[error("project {project_id} was only partially deleted: {}", failures.join("; "))]
    DeleteIncomplete {
        project_id: String,
        failures: Vec<String>,
    },

    #[error("indexing of project {0} was cancelled")]
    Cancelled(String),

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("embedding client setup failed: {0}")]
    EmbedSetup(#[source] EmbedError),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CoreError {
    /// True for errors caused by caller input rather than a failing dependency.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownProject(_) | Self::PathNotFound { .. } | Self::UnknownDocument { .. }
        )
    }
}

/// Adapter for `map_err` that tags a storage failure with its project.
pub(crate) fn storage(project_id: &str) -> impl FnOnce(StoreError) -> CoreError + '_ {
    move |source| CoreError::Storage {
        project_id: project_id.to_owned(),
        source,
    }
}

pub(crate) fn embedding(project_id: &str) -> impl FnOnce(EmbedError) -> CoreError + '_ {
    move |source| CoreError::Embedding {
        project_id: project_id.to_owned(),
        source,
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
