//! Embedding provider abstraction and the batching client used by indexing and search.

pub mod any;
pub mod client;
pub mod error;
pub mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod provider;

pub use any::AnyEmbedder;
pub use client::{EmbeddingClient, EmbeddingOptions, FailurePolicy};
pub use error::EmbedError;
pub use provider::{EmbedPurpose, EmbeddingProvider};
