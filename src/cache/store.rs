//! TTL cache storage with single-flight recomputation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use metrics::counter;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::repos::{BlogSummary, InfluencerSummary};

use super::config::CacheConfig;
use super::keys::RankedQueryKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

struct TimedEntry<T> {
    value: T,
    stored_at: Instant,
}

/// TTL-bounded cache for one ranked query.
///
/// A reader never observes a partially written entry: values are stored
/// whole under a write lock, and concurrent misses for the same key are
/// collapsed into a single computation through a per-key async mutex.
pub struct QueryCache<T: Clone> {
    name: &'static str,
    ttl: Duration,
    entries: RwLock<HashMap<RankedQueryKey, TimedEntry<T>>>,
    flights: DashMap<RankedQueryKey, Arc<Mutex<()>>>,
}

impl<T: Clone> QueryCache<T> {
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            entries: RwLock::new(HashMap::new()),
            flights: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh-entry lookup without touching the hit/miss counters.
    fn lookup(&self, key: &RankedQueryKey) -> Option<T> {
        let guard = rw_read(&self.entries, SOURCE, "lookup");
        guard
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// Return the cached value for `key` while it is still within its TTL.
    pub fn get(&self, key: &RankedQueryKey) -> Option<T> {
        match self.lookup(key) {
            Some(value) => {
                counter!("risalto_ranked_cache_hit_total", "query" => self.name).increment(1);
                Some(value)
            }
            None => {
                counter!("risalto_ranked_cache_miss_total", "query" => self.name).increment(1);
                None
            }
        }
    }

    /// Store a freshly computed value, overwriting any stale entry.
    pub fn put(&self, key: RankedQueryKey, value: T) {
        counter!("risalto_ranked_cache_store_total", "query" => self.name).increment(1);
        let mut guard = rw_write(&self.entries, SOURCE, "put");
        guard.insert(
            key,
            TimedEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Serve `key` from cache, or run `compute` once and share its result
    /// with every concurrent caller of the same key.
    ///
    /// The entry is written only when `compute` fully succeeds; an error is
    /// returned to the caller and leaves the cache untouched, so transient
    /// store failures never pin a partial or absent result.
    pub async fn get_or_compute<F, Fut, E>(&self, key: RankedQueryKey, compute: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        let flight = self
            .flights
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = flight.lock().await;

        // A concurrent caller may have finished the computation while this
        // one waited on the flight lock. The miss was already counted on the
        // fast path, so this re-check stays off the hit/miss counters.
        if let Some(value) = self.lookup(&key) {
            counter!("risalto_ranked_cache_flight_shared_total", "query" => self.name)
                .increment(1);
            return Ok(value);
        }

        debug!(cache_key = %key, "Recomputing ranked query");
        let value = compute().await?;
        self.put(key, value.clone());
        Ok(value)
    }

    pub fn invalidate_all(&self) {
        rw_write(&self.entries, SOURCE, "invalidate_all").clear();
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-wide cache for both ranked queries, created once at startup and
/// shared through an `Arc`.
pub struct RankedQueryCache {
    pub most_viewed: QueryCache<Arc<Vec<BlogSummary>>>,
    pub top_influencers: QueryCache<Arc<Vec<InfluencerSummary>>>,
}

impl RankedQueryCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            most_viewed: QueryCache::new("most-viewed-blogs", config.most_viewed_ttl()),
            top_influencers: QueryCache::new("top-influencers", config.top_influencers_ttl()),
        }
    }

    pub fn clear(&self) {
        self.most_viewed.invalidate_all();
        self.top_influencers.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn cache_with_ttl(ttl: Duration) -> QueryCache<Arc<Vec<u32>>> {
        QueryCache::new("test-query", ttl)
    }

    #[tokio::test]
    async fn hit_within_ttl_skips_recomputation() {
        let cache = cache_with_ttl(Duration::from_secs(60));
        let key = RankedQueryKey::most_viewed(10);
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_compute(key, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(Arc::new(vec![1, 2, 3]))
                })
                .await
                .expect("computed value");
            assert_eq!(*value, vec![1, 2, 3]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_ttl_entry_is_immediately_stale() {
        let cache = cache_with_ttl(Duration::ZERO);
        let key = RankedQueryKey::most_viewed(10);

        cache.put(key, Arc::new(vec![1]));
        assert!(cache.get(&key).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn distinct_limits_use_distinct_entries() {
        let cache = cache_with_ttl(Duration::from_secs(60));

        cache.put(RankedQueryKey::most_viewed(2), Arc::new(vec![1, 2]));
        cache.put(RankedQueryKey::most_viewed(3), Arc::new(vec![1, 2, 3]));

        let two = cache
            .get(&RankedQueryKey::most_viewed(2))
            .expect("entry for limit 2");
        let three = cache
            .get(&RankedQueryKey::most_viewed(3))
            .expect("entry for limit 3");
        assert_eq!(two.len(), 2);
        assert_eq!(three.len(), 3);
    }

    #[tokio::test]
    async fn errors_never_populate_the_cache() {
        let cache = cache_with_ttl(Duration::from_secs(60));
        let key = RankedQueryKey::top_influencers(10);

        let result = cache
            .get_or_compute(key, || async { Err::<Arc<Vec<u32>>, &str>("store timeout") })
            .await;
        assert_eq!(result.expect_err("computation failed"), "store timeout");
        assert!(cache.is_empty());

        // The next caller retries instead of seeing a pinned failure.
        let value = cache
            .get_or_compute(key, || async { Ok::<_, &str>(Arc::new(vec![9])) })
            .await
            .expect("second computation");
        assert_eq!(*value, vec![9]);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_computation() {
        let cache = Arc::new(cache_with_ttl(Duration::from_secs(60)));
        let key = RankedQueryKey::most_viewed(10);
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute(key, || {
                        let calls = Arc::clone(&calls);
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            Ok::<_, ()>(Arc::new(vec![42]))
                        }
                    })
                    .await
            }));
        }

        for handle in handles {
            let value = handle.await.expect("task").expect("value");
            assert_eq!(*value, vec![42]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn clear_empties_both_query_caches() {
        let cache = RankedQueryCache::new(&CacheConfig::default());
        cache
            .most_viewed
            .put(RankedQueryKey::most_viewed(10), Arc::new(Vec::new()));
        cache
            .top_influencers
            .put(RankedQueryKey::top_influencers(10), Arc::new(Vec::new()));

        cache.clear();

        assert!(cache.most_viewed.is_empty());
        assert!(cache.top_influencers.is_empty());
    }
}
