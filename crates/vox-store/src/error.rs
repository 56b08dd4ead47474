use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Qdrant error: {0}")]
    Qdrant(#[from] Box<qdrant_client::QdrantError>),

    #[error("vector store error: {0}")]
    VectorStore(#[from] crate::vector_store::VectorStoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("path {path} is not usable: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    #[error("{items} items but {embeddings} embeddings")]
    LengthMismatch { items: usize, embeddings: usize },

    #[error("embedding {index} has {actual} dimensions, index expects {expected}")]
    Dimension {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
