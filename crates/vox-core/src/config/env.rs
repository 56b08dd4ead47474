use std::str::FromStr;

use super::Config;

fn parsed<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    if let Ok(value) = raw.parse() {
        Some(value)
    } else {
        tracing::warn!("ignoring invalid {key} value: {raw}");
        None
    }
}

fn keyword<T: serde::de::DeserializeOwned>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    if let Ok(value) = serde_json::from_value(serde_json::Value::String(raw.to_lowercase())) {
        Some(value)
    } else {
        tracing::warn!("ignoring invalid {key} value: {raw}");
        None
    }
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("VOX_HOME") {
            self.storage.home = v.into();
        }
        if let Ok(v) = std::env::var("VOX_SQLITE_PATH") {
            self.storage.sqlite_path = Some(v.into());
        }
        if let Some(backend) = keyword("VOX_VECTOR_BACKEND") {
            self.storage.vector_backend = backend;
        }
        if let Ok(v) = std::env::var("VOX_QDRANT_URL") {
            self.storage.qdrant_url = v;
        }
        if let Ok(v) = std::env::var("VOX_COLLECTION") {
            self.storage.collection = v;
        }
        if let Some(secs) = parsed("VOX_STORAGE_TIMEOUT") {
            self.storage.timeout_secs = secs;
        }

        if let Some(provider) = keyword("VOX_EMBEDDING_PROVIDER") {
            self.embedding.provider = provider;
        }
        if let Ok(v) = std::env::var("VOX_EMBEDDING_BASE_URL") {
            self.embedding.base_url = v;
        }
        if let Ok(v) = std::env::var("VOX_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("VOX_EMBEDDING_API_KEY") {
            self.embedding.api_key = Some(v);
        }
        if let Some(dims) = parsed("VOX_EMBEDDING_DIMENSIONS") {
            self.embedding.dimensions = dims;
        }
        if let Some(policy) = keyword("VOX_EMBEDDING_FAILURE_POLICY") {
            self.embedding.failure_policy = policy;
        }
        if let Some(n) = parsed("VOX_EMBEDDING_CONCURRENCY") {
            self.embedding.concurrency = n;
        }
        if let Some(secs) = parsed("VOX_EMBEDDING_TIMEOUT") {
            self.embedding.timeout_secs = secs;
        }

        if let Some(size) = parsed("VOX_SCANNER_CHUNK_SIZE") {
            self.scanner.chunk_size = size;
        }
        if let Some(overlap) = parsed("VOX_SCANNER_CHUNK_OVERLAP") {
            self.scanner.chunk_overlap = overlap;
        }
        if let Some(limit) = parsed("VOX_SEARCH_LIMIT") {
            self.search.limit = limit;
        }
        if let Some(size) = parsed("VOX_INDEX_BATCH_SIZE") {
            self.index.batch_size = size;
        }
    }
}
