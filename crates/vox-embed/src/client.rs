//! Text preparation, per-call timeouts and batch embedding on top of a provider.

use std::time::Duration;

use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::error::{EmbedError, Result};
use crate::provider::{EmbedPurpose, EmbeddingProvider};

/// What a batch does when one item cannot be embedded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the batch and return the provider error.
    #[default]
    Abort,
    /// Log the error and store a zero vector for that item.
    Substitute,
}

#[derive(Debug, Clone)]
pub struct EmbeddingOptions {
    pub dimensions: usize,
    /// Texts are cut to this many characters before embedding.
    pub max_chars: usize,
    /// Sent instead of blank text, which most backends reject.
    pub placeholder: String,
    pub failure_policy: FailurePolicy,
    pub query_prefix: String,
    pub document_prefix: String,
    pub timeout: Duration,
    /// In-flight requests during a batch. Results keep input order regardless.
    pub concurrency: usize,
    /// Log batch progress every N items; 0 disables.
    pub progress_interval: usize,
}

impl Default for EmbeddingOptions {
    fn default() -> Self {
        Self {
            dimensions: 768,
            max_chars: 8000,
            placeholder: "empty".into(),
            failure_policy: FailurePolicy::Abort,
            query_prefix: String::new(),
            document_prefix: String::new(),
            timeout: Duration::from_secs(60),
            concurrency: 1,
            progress_interval: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddingClient<P> {
    provider: P,
    options: EmbeddingOptions,
}

impl<P: EmbeddingProvider> EmbeddingClient<P> {
    #[must_use]
    pub fn new(provider: P, options: EmbeddingOptions) -> Self {
        Self { provider, options }
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.options.dimensions
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    #[must_use]
    pub fn options(&self) -> &EmbeddingOptions {
        &self.options
    }

    /// The exact text sent to the provider for `text`.
    ///
    /// Blank input becomes the placeholder and the purpose prefix is
    /// prepended. The body is cut on a char boundary so that prefix and body
    /// together stay within `max_chars`.
    #[must_use]
    pub fn prepare(&self, text: &str, purpose: EmbedPurpose) -> String {
        let prefix = match purpose {
            EmbedPurpose::Document => &self.options.document_prefix,
            EmbedPurpose::Query => &self.options.query_prefix,
        };
        let budget = self
            .options
            .max_chars
            .saturating_sub(prefix.chars().count());
        let body = if text.trim().is_empty() {
            self.options.placeholder.as_str()
        } else {
            text
        };
        let body = truncate_chars(body, budget);
        let mut out = String::with_capacity(prefix.len() + body.len());
        out.push_str(prefix);
        out.push_str(body);
        out
    }

    /// Embed one text. Provider failures always propagate here; the failure
    /// policy only governs batches.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails, times out, or answers with a
    /// vector of the wrong dimensionality.
    pub async fn embed(&self, text: &str, purpose: EmbedPurpose) -> Result<Vec<f32>> {
        let prepared = self.prepare(text, purpose);
        self.request(&prepared).await
    }

    /// Embed a search query.
    ///
    /// # Errors
    ///
    /// See [`EmbeddingClient::embed`].
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(text, EmbedPurpose::Query).await
    }

    /// Embed every text, returning vectors in input order.
    ///
    /// # Errors
    ///
    /// Under [`FailurePolicy::Abort`] the first provider error is returned.
    /// A dimension mismatch is returned under either policy.
    pub async fn embed_batch(
        &self,
        texts: &[String],
        purpose: EmbedPurpose,
    ) -> Result<Vec<Vec<f32>>> {
        let total = texts.len();
        let mut vectors = Vec::with_capacity(total);
        let mut substituted = 0usize;

        let mut results = futures::stream::iter(texts.iter().enumerate())
            .map(|(index, text)| async move { (index, self.embed(text, purpose).await) })
            .buffered(self.options.concurrency.max(1));

        while let Some((index, result)) = results.next().await {
            let vector = match result {
                Ok(v) => v,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => match self.options.failure_policy {
                    FailurePolicy::Abort => {
                        tracing::error!(index, total, "embedding failed, aborting batch: {e}");
                        return Err(e);
                    }
                    FailurePolicy::Substitute => {
                        tracing::warn!(index, total, "embedding failed, storing zero vector: {e}");
                        substituted += 1;
                        vec![0.0; self.options.dimensions]
                    }
                },
            };
            vectors.push(vector);

            let done = vectors.len();
            let interval = self.options.progress_interval;
            if interval > 0 && done % interval == 0 {
                tracing::info!(
                    provider = self.provider.name(),
                    progress = format_args!("{done}/{total}"),
                    "embedding"
                );
            }
        }

        if substituted > 0 {
            tracing::warn!(substituted, total, "batch finished with zero-vector substitutes");
        }
        Ok(vectors)
    }

    async fn request(&self, prepared: &str) -> Result<Vec<f32>> {
        let vector = tokio::time::timeout(self.options.timeout, self.provider.embed(prepared))
            .await
            .map_err(|_| EmbedError::Timeout {
                provider: self.provider.name(),
                secs: Some(self.options.timeout.as_secs()),
            })??;
        if vector.len() != self.options.dimensions {
            return Err(EmbedError::DimensionMismatch {
                expected: self.options.dimensions,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
