//! Project registry, cache and the unified hybrid-ranked vector index.

pub mod cache;
pub mod error;
pub mod in_memory_store;
pub mod qdrant_ops;
pub mod registry;
pub mod sqlite;
pub mod types;
pub mod vector_index;
pub mod vector_store;

pub use cache::CacheLayer;
pub use error::StoreError;
pub use in_memory_store::InMemoryVectorStore;
pub use qdrant_ops::QdrantOps;
pub use registry::ProjectRegistry;
pub use types::{
    Document, DocumentId, DocumentKind, IndexableItem, ItemKind, ItemScope, NewDocument, Project,
    SearchResult,
};
pub use vector_index::VectorIndex;
pub use vector_store::{
    FieldCondition, FieldValue, ScoredVectorPoint, VectorFilter, VectorPoint, VectorStore,
    VectorStoreError,
};
