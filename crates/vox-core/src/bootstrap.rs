//! Construction of every component from a [`Config`].

use std::sync::Arc;

use vox_embed::http::default_client;
use vox_embed::ollama::OllamaEmbedder;
use vox_embed::openai::OpenAiEmbedder;
use vox_embed::{AnyEmbedder, EmbeddingClient, EmbeddingProvider};
use vox_index::SourceScanner;
use vox_store::sqlite::open_pool;
use vox_store::{
    CacheLayer, InMemoryVectorStore, ProjectRegistry, QdrantOps, StoreError, VectorIndex,
    VectorStore,
};

use crate::config::{Config, EmbeddingProviderKind, VectorBackend};
use crate::error::{CoreError, Result, storage};
use crate::orchestrator::{Orchestrator, OrchestratorSettings};

/// Build the configured embedding provider.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn create_embedder(config: &Config) -> Result<AnyEmbedder> {
    let emb = &config.embedding;
    let client = default_client(emb.timeout()).map_err(CoreError::EmbedSetup)?;
    let provider = match emb.provider {
        EmbeddingProviderKind::Ollama => AnyEmbedder::Ollama(OllamaEmbedder::new(
            client,
            emb.base_url.clone(),
            emb.model.clone(),
        )),
        EmbeddingProviderKind::OpenAi => AnyEmbedder::OpenAi(OpenAiEmbedder::new(
            client,
            emb.base_url.clone(),
            emb.model.clone(),
            emb.api_key.clone(),
        )),
    };
    tracing::debug!(provider = provider.name(), model = %emb.model, "embedding provider ready");
    Ok(provider)
}

/// Build the configured vector store backend.
///
/// # Errors
///
/// Returns an error if the Qdrant client cannot be created.
pub fn create_vector_store(config: &Config) -> Result<Arc<dyn VectorStore>> {
    let store: Arc<dyn VectorStore> = match config.storage.vector_backend {
        VectorBackend::Qdrant => Arc::new(
            QdrantOps::new(&config.storage.qdrant_url, config.storage.timeout())
                .map_err(|e| storage("*")(StoreError::from(e)))?,
        ),
        VectorBackend::Memory => {
            tracing::warn!("using in-memory vector store, indexed items are lost on exit");
            Arc::new(InMemoryVectorStore::new())
        }
    };
    Ok(store)
}

/// Open the metadata database and wire an orchestrator around `provider`.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or migrated, or the
/// vector store cannot be created.
pub async fn build_orchestrator_with<P: EmbeddingProvider>(
    config: &Config,
    provider: P,
    vector_store: Arc<dyn VectorStore>,
) -> Result<Orchestrator<P>> {
    let sqlite_path = config.storage.sqlite_path();
    let pool = open_pool(&sqlite_path.to_string_lossy(), config.storage.timeout())
        .await
        .map_err(storage("*"))?;

    let index = VectorIndex::new(
        vector_store,
        config.storage.collection.clone(),
        config.embedding.dimensions,
    );
    let settings = OrchestratorSettings {
        batch_size: config.index.batch_size,
        search_limit: config.search.limit,
        auto_limit: config.search.auto_limit,
        tree_max_entries: config.index.tree_max_entries,
    };
    Ok(Orchestrator::new(
        ProjectRegistry::new(pool.clone()),
        CacheLayer::new(pool),
        index,
        EmbeddingClient::new(provider, config.embedding.to_options()),
        SourceScanner::new(config.scanner.clone()),
        settings,
    ))
}

/// Everything from config: provider, vector store, database.
///
/// # Errors
///
/// See [`create_embedder`], [`create_vector_store`] and
/// [`build_orchestrator_with`].
pub async fn build_orchestrator(config: &Config) -> Result<Orchestrator<AnyEmbedder>> {
    let provider = create_embedder(config)?;
    let store = create_vector_store(config)?;
    build_orchestrator_with(config, provider, store).await
}
