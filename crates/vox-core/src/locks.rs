//! Per-project single flight.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Hands out one async mutex per project id.
///
/// Rebuilds and deletes span several stores without a shared transaction;
/// holding the project's guard for the whole operation keeps two of them
/// from interleaving.
#[derive(Debug, Clone, Default)]
pub struct ProjectLocks {
    inner: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl ProjectLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `project_id`.
    pub async fn acquire(&self, project_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            Arc::clone(map.entry(project_id.to_owned()).or_default())
        };
        lock.lock_owned().await
    }

    /// Forget `project_id` once nobody holds or awaits its lock.
    ///
    /// Returns false when the entry is still in use and was kept.
    pub async fn release(&self, project_id: &str) -> bool {
        let mut map = self.inner.lock().await;
        // Holders and waiters each keep a clone of the Arc.
        let idle = map
            .get(project_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1);
        if idle {
            map.remove(project_id);
        }
        idle
    }
}
