use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::RwLock;

use crate::vector_store::{
    FieldValue, ScoredVectorPoint, VectorFilter, VectorPoint, VectorStore, VectorStoreError,
};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

struct StoredPoint {
    vector: Vec<f32>,
    payload: HashMap<String, serde_json::Value>,
}

struct InMemoryCollection {
    points: HashMap<String, StoredPoint>,
}

/// Process-local vector store for tests and the `memory` backend.
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, InMemoryCollection>>,
}

impl InMemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVectorStore")
            .finish_non_exhaustive()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn matches_filter(payload: &HashMap<String, serde_json::Value>, filter: &VectorFilter) -> bool {
    for cond in &filter.must {
        let Some(val) = payload.get(&cond.field) else {
            return false;
        };
        if !field_matches(val, &cond.value) {
            return false;
        }
    }
    for cond in &filter.must_not {
        if let Some(val) = payload.get(&cond.field)
            && field_matches(val, &cond.value)
        {
            return false;
        }
    }
    true
}

fn field_matches(val: &serde_json::Value, expected: &FieldValue) -> bool {
    match expected {
        FieldValue::Text(s) => val.as_str() == Some(s.as_str()),
        FieldValue::Substring(s) => val.as_str().is_some_and(|v| v.contains(s.as_str())),
    }
}

impl VectorStore for InMemoryVectorStore {
    fn ensure_collection(
        &self,
        collection: &str,
        _vector_size: u64,
        _keyword_fields: &[&str],
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            cols.entry(collection)
                .or_insert_with(|| InMemoryCollection {
                    points: HashMap::new(),
                });
            Ok(())
        })
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Upsert(e.to_string()))?;
            let col = cols.get_mut(&collection).ok_or_else(|| {
                VectorStoreError::Upsert(format!("collection {collection} not found"))
            })?;
            for p in points {
                col.points.insert(
                    p.id,
                    StoredPoint {
                        vector: p.vector,
                        payload: p.payload,
                    },
                );
            }
            Ok(())
        })
    }

    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<VectorFilter>,
    ) -> BoxFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Search(e.to_string()))?;
            let col = cols.get(&collection).ok_or_else(|| {
                VectorStoreError::Search(format!("collection {collection} not found"))
            })?;

            let empty_filter = VectorFilter::default();
            let f = filter.as_ref().unwrap_or(&empty_filter);

            let mut scored: Vec<ScoredVectorPoint> = col
                .points
                .iter()
                .filter(|(_, sp)| matches_filter(&sp.payload, f))
                .map(|(id, sp)| ScoredVectorPoint {
                    id: id.clone(),
                    score: cosine_similarity(&vector, &sp.vector),
                    payload: sp.payload.clone(),
                })
                .collect();

            scored.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.id.cmp(&b.id))
            });
            scored.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
            Ok(scored)
        })
    }

    fn delete_by_filter(
        &self,
        collection: &str,
        filter: VectorFilter,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Delete(e.to_string()))?;
            if let Some(col) = cols.get_mut(&collection) {
                col.points.retain(|_, sp| !matches_filter(&sp.payload, &filter));
            }
            Ok(())
        })
    }

    fn count(
        &self,
        collection: &str,
        filter: Option<VectorFilter>,
    ) -> BoxFuture<'_, Result<u64, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Count(e.to_string()))?;
            let Some(col) = cols.get(&collection) else {
                return Ok(0);
            };
            let empty_filter = VectorFilter::default();
            let f = filter.as_ref().unwrap_or(&empty_filter);
            let n = col
                .points
                .values()
                .filter(|sp| matches_filter(&sp.payload, f))
                .count();
            Ok(u64::try_from(n).unwrap_or(u64::MAX))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, vector: Vec<f32>, project: &str, content: &str) -> VectorPoint {
        let mut payload = HashMap::new();
        payload.insert("project_id".into(), serde_json::json!(project));
        payload.insert("content".into(), serde_json::json!(content));
        VectorPoint {
            id: id.into(),
            vector,
            payload,
        }
    }

    #[tokio::test]
    async fn ensure_collection_is_idempotent() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("c", 3, &[]).await.unwrap();
        store
            .upsert("c", vec![point("a", vec![1.0, 0.0, 0.0], "p", "x")])
            .await
            .unwrap();
        store.ensure_collection("c", 3, &[]).await.unwrap();
        assert_eq!(store.count("c", None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn upsert_into_missing_collection_fails() {
        let store = InMemoryVectorStore::new();
        let err = store
            .upsert("nope", vec![point("a", vec![1.0], "p", "x")])
            .await
            .unwrap_err();
        assert!(matches!(err, VectorStoreError::Upsert(_)));
    }

    #[tokio::test]
    async fn search_orders_by_similarity() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("c", 2, &[]).await.unwrap();
        store
            .upsert(
                "c",
                vec![
                    point("far", vec![0.0, 1.0], "p", "far"),
                    point("near", vec![1.0, 0.1], "p", "near"),
                ],
            )
            .await
            .unwrap();
        let hits = store.search("c", vec![1.0, 0.0], 10, None).await.unwrap();
        assert_eq!(hits[0].id, "near");
        assert_eq!(hits[1].id, "far");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn substring_filter_is_case_sensitive() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("c", 1, &[]).await.unwrap();
        store
            .upsert(
                "c",
                vec![
                    point("a", vec![1.0], "p", "def run_system():"),
                    point("b", vec![1.0], "p", "RUN_SYSTEM notes"),
                ],
            )
            .await
            .unwrap();
        let f = VectorFilter::default().must("content", FieldValue::Substring("run_system".into()));
        let hits = store.search("c", vec![1.0], 10, Some(f)).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
    }

    #[tokio::test]
    async fn delete_by_filter_and_count() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("c", 1, &[]).await.unwrap();
        store
            .upsert(
                "c",
                vec![
                    point("a", vec![1.0], "p1", "x"),
                    point("b", vec![1.0], "p1", "y"),
                    point("c", vec![1.0], "p2", "z"),
                ],
            )
            .await
            .unwrap();
        let p1 = VectorFilter::default().must("project_id", FieldValue::Text("p1".into()));
        assert_eq!(store.count("c", Some(p1.clone())).await.unwrap(), 2);
        store.delete_by_filter("c", p1.clone()).await.unwrap();
        assert_eq!(store.count("c", Some(p1)).await.unwrap(), 0);
        assert_eq!(store.count("c", None).await.unwrap(), 1);
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).abs() < f32::EPSILON);
    }
}
