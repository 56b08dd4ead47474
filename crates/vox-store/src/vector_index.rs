//! Project-scoped item persistence and hybrid ranking.
//!
//! Ranking order: lexical hit first, then type tier (rule, symbol, rest),
//! then vector distance. Each (lexical, tier) bucket is fetched with its own
//! filtered similarity query, in rank order, until `limit` results are
//! collected. Buckets are disjoint so no result is returned twice.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Result, StoreError};
use crate::types::{IndexableItem, ItemKind, ItemScope, SearchResult};
use crate::vector_store::{FieldValue, ScoredVectorPoint, VectorFilter, VectorPoint, VectorStore};

pub const PROJECT_FIELD: &str = "project_id";
pub const CONTENT_FIELD: &str = "content";
pub const FILE_FIELD: &str = "file_path";
pub const TYPE_FIELD: &str = "type";
pub const METADATA_FIELD: &str = "metadata";
pub const CREATED_FIELD: &str = "created_at";

fn type_value(kind: ItemKind) -> FieldValue {
    FieldValue::Text(kind.as_str().to_owned())
}

/// Kinds admitted by `scope`, grouped by [`ItemKind::tier`], best tier first.
fn tier_groups(scope: ItemScope) -> Vec<Vec<ItemKind>> {
    let mut groups: BTreeMap<u8, Vec<ItemKind>> = BTreeMap::new();
    for kind in ItemKind::ALL.into_iter().filter(|k| scope.admits(*k)) {
        groups.entry(kind.tier()).or_default().push(kind);
    }
    groups.into_values().collect()
}

/// Narrow `filter` to rows whose type is in `group`.
fn restrict_to(filter: VectorFilter, group: &[ItemKind]) -> VectorFilter {
    if let [only] = group {
        return filter.must(TYPE_FIELD, type_value(*only));
    }
    ItemKind::ALL
        .into_iter()
        .filter(|k| !group.contains(k))
        .fold(filter, |f, k| f.must_not(TYPE_FIELD, type_value(k)))
}

/// Filters for every ranking bucket, best bucket first.
fn ranking_buckets(
    query_text: &str,
    project_id: Option<&str>,
    scope: ItemScope,
) -> Vec<VectorFilter> {
    let base = match project_id {
        Some(id) => VectorFilter::default().must(PROJECT_FIELD, FieldValue::Text(id.to_owned())),
        None => VectorFilter::default(),
    };
    let lexical_passes: Vec<VectorFilter> = if query_text.trim().is_empty() {
        vec![base]
    } else {
        let needle = || FieldValue::Substring(query_text.to_owned());
        vec![
            base.clone().must(CONTENT_FIELD, needle()),
            base.must_not(CONTENT_FIELD, needle()),
        ]
    };
    let groups = tier_groups(scope);
    lexical_passes
        .into_iter()
        .flat_map(|pass| {
            groups
                .iter()
                .map(move |group| restrict_to(pass.clone(), group))
        })
        .collect()
}

/// `file:line` for symbols with a start line, else the file path, else the type tag.
fn result_source(
    kind: ItemKind,
    file_path: Option<&str>,
    metadata: &serde_json::Map<String, serde_json::Value>,
) -> String {
    match (kind, file_path) {
        (ItemKind::Symbol, Some(path)) => {
            match metadata.get("start_line").and_then(serde_json::Value::as_u64) {
                Some(line) => format!("{path}:{line}"),
                None => path.to_owned(),
            }
        }
        (_, Some(path)) => path.to_owned(),
        (kind, None) => kind.as_str().to_owned(),
    }
}

fn point_to_result(point: ScoredVectorPoint) -> Option<SearchResult> {
    let payload = point.payload;
    let content = payload.get(CONTENT_FIELD)?.as_str()?.to_owned();
    let kind: ItemKind = match payload.get(TYPE_FIELD)?.as_str()?.parse() {
        Ok(kind) => kind,
        Err(e) => {
            tracing::warn!(point = %point.id, "skipping point: {e}");
            return None;
        }
    };
    let file_path = payload.get(FILE_FIELD).and_then(serde_json::Value::as_str);
    let metadata: serde_json::Map<String, serde_json::Value> = payload
        .get(METADATA_FIELD)
        .and_then(serde_json::Value::as_str)
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_default();
    let source = result_source(kind, file_path, &metadata);
    let distance = 1.0 - point.score;
    Some(SearchResult {
        content,
        source,
        relevance: 1.0 - distance,
        kind,
        metadata,
    })
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

/// The unified item table: every project, every item type, one collection.
#[derive(Clone)]
pub struct VectorIndex {
    store: Arc<dyn VectorStore>,
    collection: String,
    dimensions: usize,
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("collection", &self.collection)
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

impl VectorIndex {
    #[must_use]
    pub fn new(store: Arc<dyn VectorStore>, collection: impl Into<String>, dimensions: usize) -> Self {
        Self {
            store,
            collection: collection.into(),
            dimensions,
        }
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Create the collection and its `project_id`/`type` indexes if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector store is unreachable.
    pub async fn ensure_ready(&self) -> Result<()> {
        self.store
            .ensure_collection(
                &self.collection,
                u64::try_from(self.dimensions).unwrap_or(u64::MAX),
                &[PROJECT_FIELD, TYPE_FIELD],
            )
            .await?;
        Ok(())
    }

    /// Append `items` for `project_id`. Nothing is deduplicated: callers purge
    /// a project before a full rebuild.
    ///
    /// Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns an error if `items` and `embeddings` differ in length, an
    /// embedding has the wrong dimensionality, or the write fails.
    pub async fn upsert_items(
        &self,
        project_id: &str,
        items: &[IndexableItem],
        embeddings: Vec<Vec<f32>>,
    ) -> Result<usize> {
        if items.len() != embeddings.len() {
            return Err(StoreError::LengthMismatch {
                items: items.len(),
                embeddings: embeddings.len(),
            });
        }
        if let Some((index, bad)) = embeddings
            .iter()
            .enumerate()
            .find(|(_, e)| e.len() != self.dimensions)
        {
            return Err(StoreError::Dimension {
                index,
                expected: self.dimensions,
                actual: bad.len(),
            });
        }
        if items.is_empty() {
            return Ok(0);
        }

        let created_at = unix_now();
        let points = items
            .iter()
            .zip(embeddings)
            .map(|(item, vector)| {
                let mut payload = HashMap::new();
                payload.insert(PROJECT_FIELD.to_owned(), project_id.into());
                payload.insert(CONTENT_FIELD.to_owned(), item.content.clone().into());
                payload.insert(TYPE_FIELD.to_owned(), item.kind.as_str().into());
                if let Some(path) = &item.file_path {
                    payload.insert(FILE_FIELD.to_owned(), path.clone().into());
                }
                payload.insert(
                    METADATA_FIELD.to_owned(),
                    serde_json::to_string(&item.metadata)?.into(),
                );
                payload.insert(CREATED_FIELD.to_owned(), created_at.into());
                Ok(VectorPoint {
                    id: uuid::Uuid::new_v4().to_string(),
                    vector,
                    payload,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let written = points.len();
        self.store.upsert(&self.collection, points).await?;
        tracing::debug!(project_id, written, "upserted items");
        Ok(written)
    }

    /// Hybrid-ranked lookup. Best effort: store failures are logged and
    /// yield an empty list.
    ///
    /// The lexical boost is a case-sensitive substring test of `query_text`
    /// against stored content; blank queries skip it.
    pub async fn search(
        &self,
        query_text: &str,
        query_embedding: &[f32],
        project_id: Option<&str>,
        scope: ItemScope,
        limit: usize,
    ) -> Vec<SearchResult> {
        let mut results = Vec::with_capacity(limit);
        for filter in ranking_buckets(query_text, project_id, scope) {
            let remaining = limit - results.len();
            if remaining == 0 {
                break;
            }
            match self
                .store
                .search(
                    &self.collection,
                    query_embedding.to_vec(),
                    u64::try_from(remaining).unwrap_or(u64::MAX),
                    Some(filter),
                )
                .await
            {
                Ok(points) => results.extend(points.into_iter().filter_map(point_to_result)),
                Err(e) => {
                    tracing::error!(
                        project_id = project_id.unwrap_or("*"),
                        collection = %self.collection,
                        "search failed, returning no results: {e}"
                    );
                    return Vec::new();
                }
            }
        }
        results.truncate(limit);
        results
    }

    /// Remove every row of `project_id`, of any type.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_project_data(&self, project_id: &str) -> Result<()> {
        let filter =
            VectorFilter::default().must(PROJECT_FIELD, FieldValue::Text(project_id.to_owned()));
        self.store.delete_by_filter(&self.collection, filter).await?;
        tracing::info!(project_id, "deleted vector rows");
        Ok(())
    }

    /// Rows stored for `project_id`, optionally of a single type.
    ///
    /// # Errors
    ///
    /// Returns an error if the count request fails.
    pub async fn count(&self, project_id: &str, kind: Option<ItemKind>) -> Result<u64> {
        let mut filter =
            VectorFilter::default().must(PROJECT_FIELD, FieldValue::Text(project_id.to_owned()));
        if let Some(kind) = kind {
            filter = filter.must(TYPE_FIELD, FieldValue::Text(kind.as_str().to_owned()));
        }
        Ok(self.store.count(&self.collection, Some(filter)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory_store::InMemoryVectorStore;

    async fn index() -> VectorIndex {
        let idx = VectorIndex::new(Arc::new(InMemoryVectorStore::new()), "items", 2);
        idx.ensure_ready().await.unwrap();
        idx
    }

    /// Unit vector at `degrees` from the x axis; the query is always `[1, 0]`.
    fn at(degrees: f32) -> Vec<f32> {
        let r = degrees.to_radians();
        vec![r.cos(), r.sin()]
    }

    const QUERY: [f32; 2] = [1.0, 0.0];

    fn item(kind: ItemKind, content: &str) -> IndexableItem {
        IndexableItem::new(kind, content)
    }

    async fn put(idx: &VectorIndex, project: &str, rows: Vec<(IndexableItem, Vec<f32>)>) {
        let (items, vectors): (Vec<_>, Vec<_>) = rows.into_iter().unzip();
        idx.upsert_items(project, &items, vectors).await.unwrap();
    }

    fn contents(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.content.as_str()).collect()
    }

    #[tokio::test]
    async fn lexical_hit_beats_closer_vector_of_same_type() {
        let idx = index().await;
        put(
            &idx,
            "p",
            vec![
                (item(ItemKind::Markdown, "unrelated but very close"), at(1.0)),
                (item(ItemKind::Markdown, "mentions retry_policy here"), at(80.0)),
            ],
        )
        .await;
        let hits = idx
            .search("retry_policy", &QUERY, Some("p"), ItemScope::All, 10)
            .await;
        assert_eq!(
            contents(&hits),
            vec!["mentions retry_policy here", "unrelated but very close"]
        );
    }

    #[tokio::test]
    async fn type_tier_orders_rule_symbol_rest_within_lexical_group() {
        let idx = index().await;
        put(
            &idx,
            "p",
            vec![
                (item(ItemKind::Markdown, "cache notes"), at(0.0)),
                (item(ItemKind::Symbol, "cache symbol"), at(30.0)),
                (item(ItemKind::Rule, "cache rule"), at(60.0)),
                (item(ItemKind::Note, "cache note"), at(10.0)),
            ],
        )
        .await;
        let hits = idx.search("cache", &QUERY, Some("p"), ItemScope::All, 10).await;
        assert_eq!(
            contents(&hits),
            vec!["cache rule", "cache symbol", "cache notes", "cache note"]
        );
    }

    #[tokio::test]
    async fn lexical_tier_outranks_type_tier() {
        let idx = index().await;
        put(
            &idx,
            "p",
            vec![
                (item(ItemKind::Rule, "always log errors"), at(0.0)),
                (item(ItemKind::Markdown, "the Orchestrator owns locks"), at(45.0)),
            ],
        )
        .await;
        let hits = idx
            .search("Orchestrator", &QUERY, Some("p"), ItemScope::All, 10)
            .await;
        assert_eq!(hits[0].content, "the Orchestrator owns locks");
        assert_eq!(hits[1].content, "always log errors");
    }

    #[tokio::test]
    async fn lexical_match_is_case_sensitive() {
        let idx = index().await;
        put(
            &idx,
            "p",
            vec![
                (item(ItemKind::Markdown, "agent loop"), at(0.0)),
                (item(ItemKind::Markdown, "Agent class"), at(50.0)),
            ],
        )
        .await;
        let hits = idx.search("Agent", &QUERY, Some("p"), ItemScope::All, 10).await;
        assert_eq!(contents(&hits), vec!["Agent class", "agent loop"]);
    }

    #[tokio::test]
    async fn blank_query_ranks_by_tier_then_distance() {
        let idx = index().await;
        put(
            &idx,
            "p",
            vec![
                (item(ItemKind::Markdown, "near"), at(0.0)),
                (item(ItemKind::Markdown, "far"), at(70.0)),
                (item(ItemKind::Symbol, "sym"), at(80.0)),
            ],
        )
        .await;
        let hits = idx.search("  ", &QUERY, Some("p"), ItemScope::All, 10).await;
        assert_eq!(contents(&hits), vec!["sym", "near", "far"]);
    }

    #[tokio::test]
    async fn limit_spans_buckets() {
        let idx = index().await;
        put(
            &idx,
            "p",
            vec![
                (item(ItemKind::Rule, "x rule"), at(0.0)),
                (item(ItemKind::Symbol, "x sym"), at(0.0)),
                (item(ItemKind::Markdown, "x md"), at(0.0)),
                (item(ItemKind::Markdown, "other"), at(0.0)),
            ],
        )
        .await;
        let hits = idx.search("x", &QUERY, Some("p"), ItemScope::All, 2).await;
        assert_eq!(contents(&hits), vec!["x rule", "x sym"]);
    }

    #[tokio::test]
    async fn project_filter_scopes_results() {
        let idx = index().await;
        put(&idx, "a", vec![(item(ItemKind::Markdown, "from a"), at(0.0))]).await;
        put(&idx, "b", vec![(item(ItemKind::Markdown, "from b"), at(0.0))]).await;
        let scoped = idx.search("from", &QUERY, Some("a"), ItemScope::All, 10).await;
        assert_eq!(contents(&scoped), vec!["from a"]);
        let global = idx.search("from", &QUERY, None, ItemScope::All, 10).await;
        assert_eq!(global.len(), 2);
    }

    #[tokio::test]
    async fn scope_restricts_types() {
        let idx = index().await;
        put(
            &idx,
            "p",
            vec![
                (item(ItemKind::Symbol, "fn a"), at(0.0)),
                (item(ItemKind::Rule, "rule a"), at(0.0)),
                (item(ItemKind::Markdown, "md a"), at(0.0)),
            ],
        )
        .await;
        let symbols = idx.search("a", &QUERY, Some("p"), ItemScope::Symbols, 10).await;
        assert_eq!(contents(&symbols), vec!["fn a"]);
        let text = idx.search("a", &QUERY, Some("p"), ItemScope::Text, 10).await;
        assert_eq!(contents(&text), vec!["rule a", "md a"]);
    }

    #[tokio::test]
    async fn symbol_source_uses_file_and_line() {
        let idx = index().await;
        let sym = item(ItemKind::Symbol, "Symbol: think")
            .with_file_path("agent.py")
            .with_meta("start_line", 3);
        let bare = item(ItemKind::Symbol, "Symbol: orphan").with_file_path("b.py");
        let doc = item(ItemKind::Note, "a note");
        put(&idx, "p", vec![(sym, at(0.0)), (bare, at(10.0)), (doc, at(20.0))]).await;
        let hits = idx.search("", &QUERY, Some("p"), ItemScope::All, 10).await;
        assert_eq!(hits[0].source, "agent.py:3");
        assert_eq!(hits[0].metadata["start_line"], 3);
        assert_eq!(hits[1].source, "b.py");
        assert_eq!(hits[2].source, "note");
    }

    #[tokio::test]
    async fn relevance_is_one_minus_cosine_distance() {
        let idx = index().await;
        put(&idx, "p", vec![(item(ItemKind::Markdown, "m"), at(60.0))]).await;
        let hits = idx.search("", &QUERY, Some("p"), ItemScope::All, 1).await;
        assert!((hits[0].relevance - 0.5).abs() < 1e-4);
    }

    #[tokio::test]
    async fn content_round_trips_byte_identical() {
        let idx = index().await;
        let original = "Symbol: größe\nType: function\nCode:\ndef größe():\n\treturn '→'  \n";
        put(&idx, "p", vec![(item(ItemKind::Symbol, original), at(0.0))]).await;
        let hits = idx.search("größe", &QUERY, Some("p"), ItemScope::All, 1).await;
        assert_eq!(hits[0].content.as_bytes(), original.as_bytes());
    }

    #[tokio::test]
    async fn delete_project_data_removes_every_type() {
        let idx = index().await;
        let rows = ItemKind::ALL
            .into_iter()
            .map(|k| (item(k, k.as_str()), at(0.0)))
            .collect();
        put(&idx, "p", rows).await;
        put(&idx, "q", vec![(item(ItemKind::Rule, "keep"), at(0.0))]).await;
        assert_eq!(idx.count("p", None).await.unwrap(), 5);

        idx.delete_project_data("p").await.unwrap();
        assert_eq!(idx.count("p", None).await.unwrap(), 0);
        assert!(idx.search("", &QUERY, Some("p"), ItemScope::All, 10).await.is_empty());
        assert_eq!(idx.count("q", Some(ItemKind::Rule)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn upsert_rejects_mismatched_lengths_and_dimensions() {
        let idx = index().await;
        let items = vec![item(ItemKind::Note, "a"), item(ItemKind::Note, "b")];
        let err = idx
            .upsert_items("p", &items, vec![at(0.0)])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::LengthMismatch { items: 2, embeddings: 1 }));

        let err = idx
            .upsert_items("p", &items, vec![at(0.0), vec![1.0, 0.0, 0.0]])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Dimension { index: 1, expected: 2, actual: 3 }));
        assert_eq!(idx.count("p", None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn upsert_appends_without_dedup() {
        let idx = index().await;
        let items = vec![item(ItemKind::Note, "same")];
        idx.upsert_items("p", &items, vec![at(0.0)]).await.unwrap();
        idx.upsert_items("p", &items, vec![at(0.0)]).await.unwrap();
        assert_eq!(idx.count("p", Some(ItemKind::Note)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn search_on_missing_collection_degrades_to_empty() {
        let idx = VectorIndex::new(Arc::new(InMemoryVectorStore::new()), "never", 2);
        assert!(idx.search("x", &QUERY, None, ItemScope::All, 5).await.is_empty());
    }

    #[test]
    fn tier_groups_follow_item_tiers() {
        assert_eq!(
            tier_groups(ItemScope::All),
            vec![
                vec![ItemKind::Rule],
                vec![ItemKind::Symbol],
                vec![ItemKind::Markdown, ItemKind::Note, ItemKind::Doc],
            ]
        );
        assert_eq!(tier_groups(ItemScope::Symbols), vec![vec![ItemKind::Symbol]]);
        assert_eq!(tier_groups(ItemScope::Text).len(), 2);
    }

    #[test]
    fn bucket_count_matches_scope_and_query() {
        assert_eq!(ranking_buckets("q", None, ItemScope::All).len(), 6);
        assert_eq!(ranking_buckets("", None, ItemScope::All).len(), 3);
        assert_eq!(ranking_buckets("q", Some("p"), ItemScope::Symbols).len(), 2);
        assert_eq!(ranking_buckets("q", None, ItemScope::Text).len(), 4);
    }
}
