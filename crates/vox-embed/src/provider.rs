use std::future::Future;

use crate::error::EmbedError;

/// Whether text is embedded as a stored document or as a search query.
///
/// Asymmetric models (nomic, e5, bge) expect different framing for each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedPurpose {
    Document,
    Query,
}

pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single, already prepared text.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable, rejects the request,
    /// or answers with no vector.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, EmbedError>> + Send;

    fn name(&self) -> &'static str;
}
