//! Bounded in-memory caches.
//!
//! [`BoundedCache`] wraps a `moka` future cache with a fixed entry capacity
//! and least-recently-used eviction. Concurrent lookups of the same missing
//! key are coalesced: only one initializer runs and every waiter receives its
//! result.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use moka::future::Cache;
use moka::policy::EvictionPolicy;

#[derive(Clone)]
pub struct BoundedCache<K, V> {
    inner: Cache<K, V>,
}

impl<K, V> BoundedCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache holding at most `capacity` entries
    pub fn new(capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(capacity)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self { inner }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: K, value: V) {
        self.inner.insert(key, value).await;
    }

    /// Return the cached value or run `init` to produce it.
    ///
    /// Errors are not cached; the next caller retries the initializer.
    pub async fn get_or_try_insert_with<F, E>(&self, key: K, init: F) -> Result<V, Arc<E>>
    where
        F: Future<Output = Result<V, E>>,
        E: Send + Sync + 'static,
    {
        self.inner.try_get_with(key, init).await
    }

    /// Number of live entries after pending maintenance has run
    pub async fn len(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn clear(&self) {
        self.inner.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache: BoundedCache<String, u32> = BoundedCache::new(10);
        cache.insert("a".to_string(), 1).await;

        assert_eq!(cache.get(&"a".to_string()).await, Some(1));
        assert_eq!(cache.get(&"b".to_string()).await, None);
    }

    #[tokio::test]
    async fn test_capacity_is_bounded() {
        let cache: BoundedCache<u32, u32> = BoundedCache::new(3);
        for i in 0..20 {
            cache.insert(i, i).await;
        }

        assert!(cache.len().await <= 3);
    }

    #[tokio::test]
    async fn test_concurrent_misses_run_one_initializer() {
        let cache: BoundedCache<&'static str, u32> = BoundedCache::new(10);
        let calls = Arc::new(AtomicUsize::new(0));

        let lookups = (0..8).map(|_| {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                cache
                    .get_or_try_insert_with("key", async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        Ok::<_, std::io::Error>(42)
                    })
                    .await
            })
        });

        for handle in futures::future::join_all(lookups).await {
            assert_eq!(handle.unwrap().unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache: BoundedCache<u32, u32> = BoundedCache::new(10);

        let first = cache
            .get_or_try_insert_with(1, async { Err::<u32, _>("unavailable") })
            .await;
        assert!(first.is_err());

        let second = cache
            .get_or_try_insert_with(1, async { Ok::<_, &'static str>(7) })
            .await;
        assert_eq!(second.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache: BoundedCache<u32, u32> = BoundedCache::new(10);
        cache.insert(1, 1).await;
        cache.clear();

        assert!(cache.is_empty().await);
    }
}
