use std::io::Write;
use std::path::Path;

use serial_test::serial;
use vox_embed::FailurePolicy;

use super::*;

const ENV_KEYS: [&str; 19] = [
    "VOX_CONFIG",
    "VOX_HOME",
    "VOX_SQLITE_PATH",
    "VOX_VECTOR_BACKEND",
    "VOX_QDRANT_URL",
    "VOX_COLLECTION",
    "VOX_STORAGE_TIMEOUT",
    "VOX_EMBEDDING_PROVIDER",
    "VOX_EMBEDDING_BASE_URL",
    "VOX_EMBEDDING_MODEL",
    "VOX_EMBEDDING_API_KEY",
    "VOX_EMBEDDING_DIMENSIONS",
    "VOX_EMBEDDING_FAILURE_POLICY",
    "VOX_EMBEDDING_CONCURRENCY",
    "VOX_EMBEDDING_TIMEOUT",
    "VOX_SCANNER_CHUNK_SIZE",
    "VOX_SCANNER_CHUNK_OVERLAP",
    "VOX_SEARCH_LIMIT",
    "VOX_INDEX_BATCH_SIZE",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

fn write_config(body: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn missing_file_uses_defaults() {
    clear_env();
    let config = Config::load(Path::new("/nonexistent/vox.toml")).unwrap();
    assert_eq!(config.embedding.dimensions, 768);
    assert_eq!(config.embedding.failure_policy, FailurePolicy::Abort);
    assert_eq!(config.scanner.chunk_size, 1000);
    assert_eq!(config.scanner.chunk_overlap, 200);
    assert!(config.scanner.ignore_dirs.iter().any(|d| d == "node_modules"));
    assert_eq!(config.search.limit, 10);
    assert_eq!(config.search.auto_limit, 5);
    assert_eq!(config.index.batch_size, 64);
    assert_eq!(config.storage.vector_backend, VectorBackend::Qdrant);
    assert!(config.storage.sqlite_path().ends_with("context/vox_meta.db"));
    config.validate().unwrap();
}

#[test]
#[serial]
fn partial_file_keeps_other_defaults() {
    clear_env();
    let file = write_config(
        r#"
[storage]
vector_backend = "memory"
collection = "team"

[embedding]
provider = "openai"
base_url = "http://localhost:8080/v1"
dimensions = 384
failure_policy = "substitute"

[scanner]
ignore_dirs = ["out"]
"#,
    );
    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.storage.vector_backend, VectorBackend::Memory);
    assert_eq!(config.storage.collection, "team");
    assert_eq!(config.storage.qdrant_url, "http://localhost:6334");
    assert_eq!(config.embedding.provider, EmbeddingProviderKind::OpenAi);
    assert_eq!(config.embedding.dimensions, 384);
    assert_eq!(config.embedding.failure_policy, FailurePolicy::Substitute);
    assert_eq!(config.embedding.model, "nomic-embed-text");
    assert_eq!(config.scanner.ignore_dirs, ["out"]);
    assert_eq!(config.scanner.reserved_prefix, ".");
}

#[test]
#[serial]
fn malformed_file_is_an_error() {
    clear_env();
    let file = write_config("[embedding\ndimensions = ");
    let err = Config::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
#[serial]
fn unknown_provider_is_rejected_at_parse() {
    clear_env();
    let file = write_config("[embedding]\nprovider = \"carrier-pigeon\"\n");
    assert!(Config::load(file.path()).is_err());
}

#[test]
#[serial]
fn env_overrides_file_values() {
    clear_env();
    let file = write_config("[embedding]\nmodel = \"from-file\"\ndimensions = 16\n");
    unsafe {
        std::env::set_var("VOX_EMBEDDING_MODEL", "from-env");
        std::env::set_var("VOX_EMBEDDING_DIMENSIONS", "32");
        std::env::set_var("VOX_EMBEDDING_FAILURE_POLICY", "SUBSTITUTE");
        std::env::set_var("VOX_VECTOR_BACKEND", "memory");
        std::env::set_var("VOX_SQLITE_PATH", "/tmp/vox-test.db");
        std::env::set_var("VOX_EMBEDDING_API_KEY", "sk-test");
    }
    let config = Config::load(file.path()).unwrap();
    clear_env();

    assert_eq!(config.embedding.model, "from-env");
    assert_eq!(config.embedding.dimensions, 32);
    assert_eq!(config.embedding.failure_policy, FailurePolicy::Substitute);
    assert_eq!(config.storage.vector_backend, VectorBackend::Memory);
    assert_eq!(config.storage.sqlite_path(), Path::new("/tmp/vox-test.db"));
    assert_eq!(config.embedding.api_key.as_deref(), Some("sk-test"));
}

#[test]
#[serial]
fn invalid_env_values_are_ignored() {
    clear_env();
    unsafe {
        std::env::set_var("VOX_EMBEDDING_DIMENSIONS", "many");
        std::env::set_var("VOX_VECTOR_BACKEND", "floppy");
    }
    let config = Config::load(Path::new("/nonexistent/vox.toml")).unwrap();
    clear_env();
    assert_eq!(config.embedding.dimensions, 768);
    assert_eq!(config.storage.vector_backend, VectorBackend::Qdrant);
}

#[test]
#[serial]
fn home_override_moves_default_sqlite_path() {
    clear_env();
    unsafe { std::env::set_var("VOX_HOME", "/srv/vox") };
    let config = Config::load(Path::new("/nonexistent/vox.toml")).unwrap();
    clear_env();
    assert_eq!(
        config.storage.sqlite_path(),
        Path::new("/srv/vox/context/vox_meta.db")
    );
}

#[test]
fn validate_rejects_impossible_values() {
    let mut config = Config::default();
    config.scanner.chunk_overlap = config.scanner.chunk_size;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("chunk_overlap"));

    let mut config = Config::default();
    config.embedding.dimensions = 0;
    assert!(config.validate().unwrap_err().to_string().contains("dimensions"));

    let mut config = Config::default();
    config.index.batch_size = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.embedding.max_chars = 8;
    config.embedding.query_prefix = "search_query: ".into();
    assert!(config.validate().unwrap_err().to_string().contains("prefixes"));
}

#[test]
fn debug_redacts_api_key() {
    let mut config = Config::default();
    config.embedding.api_key = Some("sk-secret".into());
    let dbg = format!("{config:?}");
    assert!(!dbg.contains("sk-secret"));
    assert!(dbg.contains("[REDACTED]"));
}

#[test]
fn api_key_is_not_serialized() {
    let mut config = Config::default();
    config.embedding.api_key = Some("sk-secret".into());
    let rendered = toml::to_string(&config).unwrap();
    assert!(!rendered.contains("sk-secret"));
}

#[test]
#[serial]
fn config_path_priority() {
    clear_env();
    assert_eq!(
        resolve_config_path(Some(Path::new("cli.toml"))),
        Path::new("cli.toml")
    );
    unsafe { std::env::set_var("VOX_CONFIG", "env.toml") };
    assert_eq!(resolve_config_path(None), Path::new("env.toml"));
    assert_eq!(
        resolve_config_path(Some(Path::new("cli.toml"))),
        Path::new("cli.toml")
    );
    clear_env();
    assert_eq!(resolve_config_path(None), Path::new("config/default.toml"));
}
