//! End-to-end index and search over the registry, cache, scanner and vector index.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use vox_embed::{EmbedPurpose, EmbeddingClient, EmbeddingProvider};
use vox_index::SourceScanner;
use vox_index::skeleton::file_skeleton;
use vox_index::tree::render_tree;
use vox_store::{
    CacheLayer, Document, DocumentId, DocumentKind, IndexableItem, ItemKind, ItemScope,
    NewDocument, Project, ProjectRegistry, SearchResult, StoreError, VectorIndex,
};

use crate::error::{CoreError, Result, embedding, storage};
use crate::locks::ProjectLocks;
use crate::report::{IndexMode, IndexReport, ProjectStats, SearchMode, SearchOutcome, render_context};

/// Cache key of the rendered file tree.
pub const FILE_TREE_KEY: &str = "file_tree";

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub batch_size: usize,
    pub search_limit: usize,
    pub auto_limit: usize,
    pub tree_max_entries: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            batch_size: 64,
            search_limit: 10,
            auto_limit: 5,
            tree_max_entries: vox_index::tree::DEFAULT_MAX_ENTRIES,
        }
    }
}

/// A document stored by [`Orchestrator::add_document`].
#[derive(Debug, Clone)]
pub struct AddedDocument {
    pub document: Document,
    /// False when the row was stored but embedding it failed; the next index
    /// run picks it up.
    pub searchable: bool,
}

pub struct Orchestrator<P> {
    registry: ProjectRegistry,
    cache: CacheLayer,
    index: VectorIndex,
    embedder: EmbeddingClient<P>,
    scanner: SourceScanner,
    locks: ProjectLocks,
    settings: OrchestratorSettings,
}

impl<P> std::fmt::Debug for Orchestrator<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("index", &self.index)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<P: EmbeddingProvider> Orchestrator<P> {
    #[must_use]
    pub fn new(
        registry: ProjectRegistry,
        cache: CacheLayer,
        index: VectorIndex,
        embedder: EmbeddingClient<P>,
        scanner: SourceScanner,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            registry,
            cache,
            index,
            embedder,
            scanner,
            locks: ProjectLocks::new(),
            settings,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &ProjectRegistry {
        &self.registry
    }

    #[must_use]
    pub fn cache(&self) -> &CacheLayer {
        &self.cache
    }

    #[must_use]
    pub fn vector_index(&self) -> &VectorIndex {
        &self.index
    }

    #[must_use]
    pub fn locks(&self) -> &ProjectLocks {
        &self.locks
    }

    /// Register a project root, or return the project already registered there.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PathNotFound`] if `path` is not an existing directory.
    pub async fn create_project(&self, path: &Path, name: Option<&str>) -> Result<Project> {
        self.registry
            .create_project(path, name)
            .await
            .map_err(|e| match e {
                StoreError::InvalidPath { .. } => CoreError::PathNotFound {
                    path: path.to_path_buf(),
                },
                other => storage("*")(other),
            })
    }

    /// # Errors
    ///
    /// Returns an error if the registry cannot be read.
    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        self.registry.list_projects().await.map_err(storage("*"))
    }

    /// # Errors
    ///
    /// Returns [`CoreError::UnknownProject`] if no project has this id.
    pub async fn get_project(&self, project_id: &str) -> Result<Project> {
        self.registry
            .get_project(project_id)
            .await
            .map_err(storage(project_id))?
            .ok_or_else(|| CoreError::UnknownProject(project_id.to_owned()))
    }

    /// Remove a project with its vectors, cache entries and documents.
    ///
    /// Vector rows and cache entries are purged independently; the registry
    /// row (and with it the documents) goes only when both succeeded, so a
    /// failed delete can be retried.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownProject`] for an unknown id and
    /// [`CoreError::DeleteIncomplete`] listing every store that failed.
    pub async fn delete_project(&self, project_id: &str) -> Result<Project> {
        self.get_project(project_id).await?;
        let deleted = {
            let _guard = self.locks.acquire(project_id).await;
            self.purge_project(project_id).await
        };
        if deleted.is_ok() {
            self.locks.release(project_id).await;
        }
        deleted
    }

    async fn purge_project(&self, project_id: &str) -> Result<Project> {
        // A concurrent delete may have won the lock first.
        let project = self.get_project(project_id).await?;

        let mut failures = Vec::new();
        if let Err(e) = self.index.delete_project_data(project_id).await {
            failures.push(format!("vector index: {e}"));
        }
        if let Err(e) = self.cache.invalidate(project_id, None).await {
            failures.push(format!("cache: {e}"));
        }
        if failures.is_empty()
            && let Err(e) = self.registry.delete_project(project_id).await
        {
            failures.push(format!("registry: {e}"));
        }

        if failures.is_empty() {
            tracing::info!(project_id, "project deleted");
            Ok(project)
        } else {
            tracing::error!(project_id, ?failures, "project delete incomplete");
            Err(CoreError::DeleteIncomplete {
                project_id: project_id.to_owned(),
                failures,
            })
        }
    }

    /// Store a document and make it searchable right away.
    ///
    /// The embedding goes through the configured failure policy: under
    /// `substitute` a failed call stores a zero vector, under `abort` the
    /// insert is kept and the document is returned with `searchable = false`
    /// so the next index run picks it up.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownProject`] or a storage error, and an
    /// embedding error when the provider returns vectors of the wrong size.
    /// A failed vector write after a successful embedding is also an error.
    pub async fn add_document(&self, project_id: &str, doc: &NewDocument) -> Result<AddedDocument> {
        self.get_project(project_id).await?;
        let _guard = self.locks.acquire(project_id).await;
        self.get_project(project_id).await?;
        let document = self
            .registry
            .add_document(project_id, doc)
            .await
            .map_err(storage(project_id))?;

        let item = document.to_item();
        let vectors = match self
            .embedder
            .embed_batch(std::slice::from_ref(&item.content), EmbedPurpose::Document)
            .await
        {
            Ok(vectors) => vectors,
            Err(e) if e.is_fatal() => return Err(embedding(project_id)(e)),
            Err(e) => {
                tracing::warn!(
                    project_id,
                    document_id = %document.id,
                    "document stored but not embedded, rebuild the index to include it: {e}"
                );
                return Ok(AddedDocument {
                    document,
                    searchable: false,
                });
            }
        };
        self.index.ensure_ready().await.map_err(storage(project_id))?;
        self.index
            .upsert_items(project_id, std::slice::from_ref(&item), vectors)
            .await
            .map_err(storage(project_id))?;
        tracing::info!(project_id, document_id = %document.id, kind = %document.kind, "document added");
        Ok(AddedDocument {
            document,
            searchable: true,
        })
    }

    /// Read `path` and store it as a document, titled by its file name unless
    /// `title` is given.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`] if the file cannot be read, otherwise as
    /// [`Orchestrator::add_document`].
    pub async fn add_document_from_file(
        &self,
        project_id: &str,
        kind: DocumentKind,
        path: &Path,
        title: Option<String>,
    ) -> Result<AddedDocument> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let title = title.or_else(|| {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
        });
        let doc = NewDocument {
            kind,
            title,
            content,
            file_path: Some(path.to_string_lossy().into_owned()),
        };
        self.add_document(project_id, &doc).await
    }

    /// # Errors
    ///
    /// Returns [`CoreError::UnknownProject`] or a storage error.
    pub async fn list_documents(&self, project_id: &str) -> Result<Vec<Document>> {
        self.get_project(project_id).await?;
        self.registry
            .list_documents(project_id)
            .await
            .map_err(storage(project_id))
    }

    /// # Errors
    ///
    /// Returns [`CoreError::UnknownDocument`] if the id is not in this project.
    pub async fn get_document(&self, project_id: &str, id: DocumentId) -> Result<Document> {
        self.registry
            .get_document(project_id, id)
            .await
            .map_err(storage(project_id))?
            .ok_or_else(|| CoreError::UnknownDocument {
                project_id: project_id.to_owned(),
                id,
            })
    }

    /// Delete the registry row only. Its vector stays searchable until the
    /// next forced rebuild.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownDocument`] if the id is not in this project.
    pub async fn delete_document(&self, project_id: &str, id: DocumentId) -> Result<()> {
        let deleted = self
            .registry
            .delete_document(project_id, id)
            .await
            .map_err(storage(project_id))?;
        if deleted {
            tracing::info!(project_id, document_id = %id, "document deleted");
            Ok(())
        } else {
            Err(CoreError::UnknownDocument {
                project_id: project_id.to_owned(),
                id,
            })
        }
    }

    /// Scan, embed and store a project.
    ///
    /// With `force`, the project's vector rows and cache are purged first so
    /// the run fully replaces the previous index. Without it, new rows are
    /// appended to whatever is stored. The file-tree snapshot is refreshed on
    /// every run.
    ///
    /// # Errors
    ///
    /// Returns an error if the project is unknown, its root is gone, the
    /// embedding batch fails under the abort policy, a write fails, or
    /// `cancel` fires between batches.
    pub async fn index(
        &self,
        project_id: &str,
        mode: IndexMode,
        force: bool,
        cancel: &CancellationToken,
    ) -> Result<IndexReport> {
        let start = Instant::now();
        self.get_project(project_id).await?;
        let _guard = self.locks.acquire(project_id).await;
        let project = self.get_project(project_id).await?;
        let root = PathBuf::from(&project.path);
        if !root.is_dir() {
            return Err(CoreError::PathNotFound { path: root });
        }

        self.index.ensure_ready().await.map_err(storage(project_id))?;
        if force {
            self.index
                .delete_project_data(project_id)
                .await
                .map_err(storage(project_id))?;
            let purged = self
                .cache
                .invalidate(project_id, None)
                .await
                .map_err(storage(project_id))?;
            tracing::info!(project_id, cache_entries = purged, "purged project before rebuild");
        }

        self.refresh_tree(project_id, &root).await?;

        let scanner = self.scanner.clone();
        let scan_root = root.clone();
        let outcome = tokio::task::spawn_blocking(move || scanner.scan(&scan_root))
            .await?
            .map_err(|source| CoreError::Scan {
                project_id: project_id.to_owned(),
                source,
            })?;

        let mut report = IndexReport {
            project_id: project_id.to_owned(),
            mode,
            forced: force,
            files_scanned: outcome.files_scanned,
            files_skipped: outcome.files_skipped,
            ..IndexReport::default()
        };
        let (symbols, chunks) = outcome.partition();

        if mode.includes_symbols() {
            report.symbols_indexed = self.embed_and_store(project_id, &symbols, cancel).await?;
        }
        if mode.includes_text() {
            let documents: Vec<IndexableItem> = self
                .registry
                .list_documents(project_id)
                .await
                .map_err(storage(project_id))?
                .iter()
                .map(Document::to_item)
                .collect();
            report.chunks_indexed = self.embed_and_store(project_id, &chunks, cancel).await?;
            report.documents_indexed =
                self.embed_and_store(project_id, &documents, cancel).await?;
        }

        report.duration_ms = start.elapsed().as_millis().try_into().unwrap_or(u64::MAX);
        tracing::info!(
            project_id,
            mode = %mode,
            force,
            items = report.items_indexed(),
            duration_ms = report.duration_ms,
            "index finished"
        );
        Ok(report)
    }

    async fn embed_and_store(
        &self,
        project_id: &str,
        items: &[IndexableItem],
        cancel: &CancellationToken,
    ) -> Result<usize> {
        let mut written = 0;
        for batch in items.chunks(self.settings.batch_size.max(1)) {
            if cancel.is_cancelled() {
                tracing::warn!(project_id, written, "index cancelled");
                return Err(CoreError::Cancelled(project_id.to_owned()));
            }
            let texts: Vec<String> = batch.iter().map(|item| item.content.clone()).collect();
            let vectors = self
                .embedder
                .embed_batch(&texts, EmbedPurpose::Document)
                .await
                .map_err(embedding(project_id))?;
            written += self
                .index
                .upsert_items(project_id, batch, vectors)
                .await
                .map_err(storage(project_id))?;
        }
        Ok(written)
    }

    async fn refresh_tree(&self, project_id: &str, root: &Path) -> Result<String> {
        let config = self.scanner.config().clone();
        let max_entries = self.settings.tree_max_entries;
        let tree_root = root.to_path_buf();
        let tree = tokio::task::spawn_blocking(move || render_tree(&tree_root, &config, max_entries))
            .await?
            .map_err(|source| CoreError::Scan {
                project_id: project_id.to_owned(),
                source,
            })?;
        self.cache
            .set(project_id, FILE_TREE_KEY, &tree)
            .await
            .map_err(storage(project_id))?;
        Ok(tree)
    }

    /// Embed `query` once and run the searches `mode` asks for.
    ///
    /// `limit` applies to each list; when `None` the configured limit is used
    /// (the auto limit in [`SearchMode::Auto`]). Store failures yield empty
    /// lists rather than errors, and so does a scope with no stored rows,
    /// including an unknown or deleted project.
    ///
    /// # Errors
    ///
    /// Returns an embedding error if the query cannot be embedded.
    pub async fn search(
        &self,
        query: &str,
        project_id: Option<&str>,
        mode: SearchMode,
        limit: Option<usize>,
    ) -> Result<SearchOutcome> {
        let scope_label = project_id.unwrap_or("*");
        let vector = self
            .embedder
            .embed_query(query)
            .await
            .map_err(embedding(scope_label))?;

        let outcome = match mode {
            SearchMode::Symbolic => {
                let limit = limit.unwrap_or(self.settings.search_limit);
                SearchOutcome {
                    text: None,
                    symbols: Some(
                        self.run_search(query, &vector, project_id, ItemScope::Symbols, limit)
                            .await,
                    ),
                }
            }
            SearchMode::Semantic => {
                let limit = limit.unwrap_or(self.settings.search_limit);
                SearchOutcome {
                    text: Some(
                        self.run_search(query, &vector, project_id, ItemScope::Text, limit)
                            .await,
                    ),
                    symbols: None,
                }
            }
            SearchMode::Auto => {
                let limit = limit.unwrap_or(self.settings.auto_limit);
                SearchOutcome {
                    text: Some(
                        self.run_search(query, &vector, project_id, ItemScope::Text, limit)
                            .await,
                    ),
                    symbols: Some(
                        self.run_search(query, &vector, project_id, ItemScope::Symbols, limit)
                            .await,
                    ),
                }
            }
        };
        tracing::debug!(
            project_id = scope_label,
            mode = %mode,
            text = outcome.text.as_ref().map_or(0, Vec::len),
            symbols = outcome.symbols.as_ref().map_or(0, Vec::len),
            "search finished"
        );
        Ok(outcome)
    }

    async fn run_search(
        &self,
        query: &str,
        vector: &[f32],
        project_id: Option<&str>,
        scope: ItemScope,
        limit: usize,
    ) -> Vec<SearchResult> {
        self.index
            .search(query, vector, project_id, scope, limit)
            .await
    }

    /// Both result lists rendered as a context block for an agent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownProject`], or an embedding error as
    /// [`Orchestrator::search`].
    pub async fn context(&self, question: &str, project_id: &str) -> Result<String> {
        self.get_project(project_id).await?;
        let outcome = self
            .search(question, Some(project_id), SearchMode::Auto, None)
            .await?;
        Ok(render_context(&outcome))
    }

    /// The cached file tree, rendered and cached first if missing or `refresh` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the project is unknown or its root cannot be walked.
    pub async fn project_tree(&self, project_id: &str, refresh: bool) -> Result<String> {
        let project = self.get_project(project_id).await?;
        if !refresh
            && let Some(serde_json::Value::String(tree)) = self
                .cache
                .get(project_id, FILE_TREE_KEY)
                .await
                .map_err(storage(project_id))?
        {
            return Ok(tree);
        }
        let root = PathBuf::from(&project.path);
        if !root.is_dir() {
            return Err(CoreError::PathNotFound { path: root });
        }
        self.refresh_tree(project_id, &root).await
    }

    /// Signature outline of one file inside the project.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PathNotFound`] if the file does not exist or
    /// resolves outside the project root.
    pub async fn file_skeleton(&self, project_id: &str, relative_path: &str) -> Result<String> {
        let project = self.get_project(project_id).await?;
        let root = PathBuf::from(&project.path);
        let requested = root.join(relative_path);
        let not_found = || CoreError::PathNotFound {
            path: requested.clone(),
        };
        let resolved = tokio::fs::canonicalize(&requested)
            .await
            .map_err(|_| not_found())?;
        if !resolved.starts_with(&root) || !resolved.is_file() {
            return Err(not_found());
        }
        let source = tokio::fs::read_to_string(&resolved)
            .await
            .map_err(|source| CoreError::Io {
                path: resolved.clone(),
                source,
            })?;
        let rel = resolved
            .strip_prefix(&root)
            .map_or_else(|_| relative_path.to_owned(), |p| p.to_string_lossy().into_owned());
        Ok(file_skeleton(&source, &rel, self.scanner.registry()))
    }

    /// Document, item and cache counts for a project.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownProject`] or a storage error.
    pub async fn project_stats(&self, project_id: &str) -> Result<ProjectStats> {
        let project = self.get_project(project_id).await?;
        self.index.ensure_ready().await.map_err(storage(project_id))?;
        let documents = self
            .registry
            .count_documents(project_id)
            .await
            .map_err(storage(project_id))?;
        let mut items = Vec::with_capacity(ItemKind::ALL.len());
        for kind in ItemKind::ALL {
            let count = self
                .index
                .count(project_id, Some(kind))
                .await
                .map_err(storage(project_id))?;
            items.push((kind, count));
        }
        let cache_entries = self
            .cache
            .count(project_id)
            .await
            .map_err(storage(project_id))?;
        Ok(ProjectStats {
            project,
            documents,
            items,
            cache_entries,
        })
    }
}
