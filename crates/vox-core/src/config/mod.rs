mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str::<Self>(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source: Box::new(source),
            })?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Reject settings no run could succeed with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            (self.embedding.dimensions == 0, "embedding.dimensions must be > 0"),
            (self.embedding.max_chars == 0, "embedding.max_chars must be > 0"),
            (
                self.embedding.query_prefix.chars().count() >= self.embedding.max_chars
                    || self.embedding.document_prefix.chars().count() >= self.embedding.max_chars,
                "embedding prefixes must be shorter than embedding.max_chars",
            ),
            (self.embedding.concurrency == 0, "embedding.concurrency must be > 0"),
            (self.embedding.timeout_secs == 0, "embedding.timeout_secs must be > 0"),
            (self.embedding.model.trim().is_empty(), "embedding.model must not be empty"),
            (self.scanner.chunk_size == 0, "scanner.chunk_size must be > 0"),
            (
                self.scanner.chunk_overlap >= self.scanner.chunk_size,
                "scanner.chunk_overlap must be smaller than scanner.chunk_size",
            ),
            (self.search.limit == 0, "search.limit must be > 0"),
            (self.search.auto_limit == 0, "search.auto_limit must be > 0"),
            (self.index.batch_size == 0, "index.batch_size must be > 0"),
            (self.storage.timeout_secs == 0, "storage.timeout_secs must be > 0"),
            (self.storage.collection.trim().is_empty(), "storage.collection must not be empty"),
        ];
        match checks.into_iter().find(|(failed, _)| *failed) {
            Some((_, message)) => Err(ConfigError::Invalid(message.to_owned())),
            None => Ok(()),
        }
    }
}

/// Priority: `--config` value > `VOX_CONFIG` > `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("VOX_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}
