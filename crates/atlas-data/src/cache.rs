//! Process-wide dataset cache.
//!
//! One slot per dataset key. A slot is written at most once, by the first
//! load of that key that succeeds; nothing is ever evicted or replaced.
//! Concurrent first requests for the same key wait on the same in-flight
//! load instead of each starting their own. A failed load leaves the slot
//! empty, so the next request tries again.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{OnceCell, RwLock};
use tracing::debug;

use atlas_common::{AtlasError, DatasetKey, FetchFailure};

type CachedValue = Arc<dyn Any + Send + Sync>;

struct Resolved {
    value: CachedValue,
    resolved_at: DateTime<Utc>,
}

type Slot = Arc<OnceCell<Resolved>>;

/// Unbounded, append-only map from dataset key to decoded value.
#[derive(Default)]
pub struct DatasetCache {
    slots: RwLock<HashMap<DatasetKey, Slot>>,
}

impl std::fmt::Debug for DatasetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetCache")
            .field("slots", &"<cached datasets>")
            .finish()
    }
}

/// One resolved entry, as reported by [`DatasetCache::stats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntryInfo {
    pub key: DatasetKey,
    pub resolved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    /// Keys with a stored value
    pub resolved: usize,
    /// Keys that have been requested but hold no value (in flight or failed)
    pub unresolved: usize,
    pub entries: Vec<CacheEntryInfo>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, key: &DatasetKey) -> Slot {
        {
            let slots = self.slots.read().await;
            if let Some(slot) = slots.get(key) {
                return Arc::clone(slot);
            }
        }
        let mut slots = self.slots.write().await;
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    /// Return the cached value for `key`, or run `load` to produce it.
    ///
    /// `load` runs at most once per successful key: callers arriving while a
    /// load is in flight wait for it. Errors are returned to the caller that
    /// ran the load and are not stored.
    pub async fn get_or_load<T, F, Fut>(&self, key: &DatasetKey, load: F) -> Result<Arc<T>, AtlasError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchFailure>>,
    {
        let slot = self.slot(key).await;

        if let Some(resolved) = slot.get() {
            debug!(key = %key, "Dataset cache hit");
            return downcast(key, &resolved.value);
        }

        let resolved = slot
            .get_or_try_init(|| async {
                debug!(key = %key, "Dataset cache miss");
                let value = load().await?;
                Ok::<_, FetchFailure>(Resolved {
                    value: Arc::new(value),
                    resolved_at: Utc::now(),
                })
            })
            .await?;

        downcast(key, &resolved.value)
    }

    /// Cached value for `key`, without loading.
    pub async fn get<T: Send + Sync + 'static>(&self, key: &DatasetKey) -> Option<Arc<T>> {
        let slots = self.slots.read().await;
        let resolved = slots.get(key)?.get()?;
        downcast(key, &resolved.value).ok()
    }

    pub async fn contains(&self, key: &DatasetKey) -> bool {
        let slots = self.slots.read().await;
        slots.get(key).is_some_and(|slot| slot.initialized())
    }

    /// Number of keys holding a value.
    pub async fn len(&self) -> usize {
        let slots = self.slots.read().await;
        slots.values().filter(|slot| slot.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> CacheStats {
        let slots = self.slots.read().await;
        let mut entries: Vec<CacheEntryInfo> = slots
            .iter()
            .filter_map(|(key, slot)| {
                slot.get().map(|r| CacheEntryInfo {
                    key: key.clone(),
                    resolved_at: r.resolved_at,
                })
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        CacheStats {
            resolved: entries.len(),
            unresolved: slots.len() - entries.len(),
            entries,
        }
    }
}

fn downcast<T: Send + Sync + 'static>(key: &DatasetKey, value: &CachedValue) -> Result<Arc<T>, AtlasError> {
    Arc::clone(value)
        .downcast::<T>()
        .map_err(|_| AtlasError::TypeMismatch { key: key.clone() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use atlas_common::Dataset;

    #[tokio::test]
    async fn test_second_load_is_served_from_cache() {
        let cache = DatasetCache::new();
        let key = Dataset::Modules.key();
        let calls = AtomicUsize::new(0);

        let first = cache
            .get_or_load(&key, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![1u32, 2, 3])
            })
            .await
            .unwrap();
        let second = cache
            .get_or_load(&key, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![9u32])
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*second, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let cache = DatasetCache::new();
        let key = Dataset::GeneIndex.key();

        let err = cache
            .get_or_load::<u32, _, _>(&key, || async { Err(FetchFailure::status(Dataset::GeneIndex.key(), 503)) })
            .await
            .unwrap_err();
        assert!(matches!(err, AtlasError::Fetch(ref f) if f.status_code() == Some(503)));
        assert!(!cache.contains(&key).await);

        let value = cache.get_or_load(&key, || async { Ok(7u32) }).await.unwrap();
        assert_eq!(*value, 7);
        assert!(cache.contains(&key).await);
    }

    #[tokio::test]
    async fn test_concurrent_first_requests_share_one_load() {
        let cache = DatasetCache::new();
        let key = Dataset::GlobalSummary.key();
        let calls = AtomicUsize::new(0);

        let load = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok(String::from("summary"))
        };
        let (a, b) = tokio::join!(cache.get_or_load(&key, load), cache.get_or_load(&key, load));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
    }

    #[tokio::test]
    async fn test_type_mismatch_reported() {
        let cache = DatasetCache::new();
        let key = Dataset::Modules.key();
        cache.get_or_load(&key, || async { Ok(1u32) }).await.unwrap();

        let err = cache.get_or_load::<String, _, _>(&key, || async { Ok(String::new()) }).await.unwrap_err();
        assert!(matches!(err, AtlasError::TypeMismatch { .. }));
        assert!(cache.get::<String>(&key).await.is_none());
        assert_eq!(cache.get::<u32>(&key).await.as_deref(), Some(&1));
    }

    #[tokio::test]
    async fn test_stats_list_resolved_keys_in_order() {
        let cache = DatasetCache::new();
        cache.get_or_load(&Dataset::Modules.key(), || async { Ok(0u8) }).await.unwrap();
        cache.get_or_load(&Dataset::GeneIndex.key(), || async { Ok(0u8) }).await.unwrap();
        let _ = cache
            .get_or_load::<u8, _, _>(&Dataset::NovelClusters.key(), || async {
                Err(FetchFailure::network(Dataset::NovelClusters.key(), "down"))
            })
            .await;

        let stats = cache.stats().await;
        assert_eq!(stats.resolved, 2);
        assert_eq!(stats.unresolved, 1);
        let keys: Vec<&str> = stats.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["gene_index.json", "modules.json"]);
        assert_eq!(cache.len().await, 2);
    }
}
