use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vox_embed::{EmbeddingOptions, FailurePolicy};
use vox_index::ScannerConfig;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub scanner: ScannerConfig,
    pub search: SearchConfig,
    pub index: IndexConfig,
}

/// Vector store backend selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    #[default]
    Qdrant,
    /// Process-local store; contents are lost on exit.
    Memory,
}

fn default_home() -> PathBuf {
    std::env::var_os("HOME")
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
        .join(".vox-brain")
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub home: PathBuf,
    /// Defaults to `<home>/context/vox_meta.db`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sqlite_path: Option<PathBuf>,
    pub vector_backend: VectorBackend,
    pub qdrant_url: String,
    pub collection: String,
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            home: default_home(),
            sqlite_path: None,
            vector_backend: VectorBackend::default(),
            qdrant_url: "http://localhost:6334".into(),
            collection: "vox_items".into(),
            timeout_secs: 30,
        }
    }
}

impl StorageConfig {
    #[must_use]
    pub fn sqlite_path(&self) -> PathBuf {
        self.sqlite_path
            .clone()
            .unwrap_or_else(|| self.home.join("context").join("vox_meta.db"))
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Embedding backend selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    #[default]
    Ollama,
    /// Any server exposing an OpenAI-compatible `/embeddings` endpoint.
    OpenAi,
}

#[derive(Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub dimensions: usize,
    pub max_chars: usize,
    pub placeholder: String,
    pub failure_policy: FailurePolicy,
    pub query_prefix: String,
    pub document_prefix: String,
    pub timeout_secs: u64,
    pub concurrency: usize,
    pub progress_interval: usize,
}

impl std::fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("dimensions", &self.dimensions)
            .field("failure_policy", &self.failure_policy)
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let options = EmbeddingOptions::default();
        Self {
            provider: EmbeddingProviderKind::default(),
            base_url: "http://localhost:11434".into(),
            model: "nomic-embed-text".into(),
            api_key: None,
            dimensions: options.dimensions,
            max_chars: options.max_chars,
            placeholder: options.placeholder,
            failure_policy: options.failure_policy,
            query_prefix: options.query_prefix,
            document_prefix: options.document_prefix,
            timeout_secs: options.timeout.as_secs(),
            concurrency: options.concurrency,
            progress_interval: options.progress_interval,
        }
    }
}

impl EmbeddingConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn to_options(&self) -> EmbeddingOptions {
        EmbeddingOptions {
            dimensions: self.dimensions,
            max_chars: self.max_chars,
            placeholder: self.placeholder.clone(),
            failure_policy: self.failure_policy,
            query_prefix: self.query_prefix.clone(),
            document_prefix: self.document_prefix.clone(),
            timeout: self.timeout(),
            concurrency: self.concurrency,
            progress_interval: self.progress_interval,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Results per list for single-mode searches.
    pub limit: usize,
    /// Results per list when auto mode runs both searches.
    pub auto_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: 10,
            auto_limit: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Items embedded and written per step; cancellation is checked between steps.
    pub batch_size: usize,
    pub tree_max_entries: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            batch_size: 64,
            tree_max_entries: vox_index::tree::DEFAULT_MAX_ENTRIES,
        }
    }
}
