//! Test-only deterministic embedder.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::EmbedError;
use crate::provider::EmbeddingProvider;

/// Bag-of-words hashing embedder: texts sharing tokens land close together.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    pub dimensions: usize,
    /// Any text containing this marker fails with [`EmbedError::Rejected`].
    pub fail_on: Option<String>,
    /// Every call fails with [`EmbedError::Connection`].
    pub unreachable: bool,
    /// Milliseconds to sleep before answering.
    pub delay_ms: u64,
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(16)
    }
}

impl MockEmbedder {
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            fail_on: None,
            unreachable: false,
            delay_ms: 0,
            calls: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[must_use]
    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_on = Some(marker.to_owned());
        self
    }

    #[must_use]
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    #[must_use]
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Texts exactly as they reached the provider, in call order.
    #[must_use]
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Deterministic vector for `text`, identical to what `embed` returns.
    #[must_use]
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0_f32; self.dimensions.max(1)];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let len = u64::try_from(v.len()).unwrap_or(u64::MAX);
            let bucket = usize::try_from(fnv1a(&token.to_lowercase()) % len).unwrap_or(0);
            v[bucket] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        } else {
            v[0] = 1.0;
        }
        v
    }
}

fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in s.bytes() {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_owned());
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        if self.unreachable {
            return Err(EmbedError::Connection {
                provider: "mock",
                url: "mock://".into(),
                message: "connection refused".into(),
            });
        }
        if let Some(marker) = &self.fail_on
            && text.contains(marker.as_str())
        {
            return Err(EmbedError::Rejected {
                provider: "mock",
                status: 400,
                body: format!("refusing text containing {marker:?}"),
            });
        }
        Ok(self.vector_for(text))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
