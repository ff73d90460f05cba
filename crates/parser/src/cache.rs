//! Keyed cache of completed analyses
//!
//! Each key owns a slot holding a `tokio::sync::OnceCell`. Concurrent callers
//! for one key share the slot, so only the first runs the build while the
//! rest await its result. A failed build leaves the slot empty and the next
//! caller retries.

use parking_lot::Mutex;
use restmap_common::{Analysis, Result};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

type Slot = Arc<OnceCell<Arc<Analysis>>>;

/// Shared, explicitly constructed analysis cache
///
/// Wrap it in an `Arc` to share one cache between several analyzers.
#[derive(Debug, Default)]
pub struct AnalysisCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached analysis for `key`, building it with `build` on a miss
    ///
    /// The map lock is only held to look up the slot, never across the build.
    pub async fn get_or_try_insert_with<F, Fut>(&self, key: &str, build: F) -> Result<Arc<Analysis>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Analysis>>,
    {
        let slot = self.slot(key);
        if let Some(analysis) = slot.get() {
            info!(key, "analysis cache hit");
            return Ok(Arc::clone(analysis));
        }

        debug!(key, "analysis cache miss");
        match slot
            .get_or_try_init(|| async move { build().await.map(Arc::new) })
            .await
        {
            Ok(analysis) => Ok(Arc::clone(analysis)),
            Err(e) => {
                self.discard_empty(key, &slot);
                Err(e)
            }
        }
    }

    /// Cached analysis without building
    pub fn get(&self, key: &str) -> Option<Arc<Analysis>> {
        self.slots
            .lock()
            .get(key)
            .and_then(|slot| slot.get().cloned())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Drop one key; returns whether a completed analysis was evicted
    pub fn invalidate(&self, key: &str) -> bool {
        let evicted = self
            .slots
            .lock()
            .remove(key)
            .is_some_and(|slot| slot.initialized());
        debug!(key, evicted, "invalidated analysis cache entry");
        evicted
    }

    pub fn clear(&self) {
        self.slots.lock().clear();
        debug!("cleared analysis cache");
    }

    /// Number of completed analyses
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: &str) -> Slot {
        Arc::clone(self.slots.lock().entry(key.to_string()).or_default())
    }

    /// Remove `slot` if it is still the one registered for `key` and empty
    fn discard_empty(&self, key: &str, slot: &Slot) {
        let mut slots = self.slots.lock();
        if slots
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, slot) && !current.initialized())
        {
            slots.remove(key);
        }
    }
}
