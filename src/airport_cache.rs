// In-memory TTL cache for airport search results, keyed by normalized keyword

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::api::{AirportLookup, ApiError};
use crate::models::AirportOption;

#[derive(Debug, Default)]
pub struct CacheStats {
    pub items_count: AtomicUsize,
    pub hit_count: AtomicUsize,
    pub miss_count: AtomicUsize,
    pub eviction_count: AtomicUsize,
    pub expired_count: AtomicUsize,
    pub average_lookup_time_ns: AtomicU64,
    pub total_lookups: AtomicUsize,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CacheStatsReport {
    pub items_count: usize,
    pub hit_count: usize,
    pub miss_count: usize,
    pub eviction_count: usize,
    pub expired_count: usize,
    pub average_lookup_time_ns: u64,
    pub total_lookups: usize,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub default_ttl_seconds: u64,
    pub cleanup_interval_seconds: u64,
    pub eviction_policy: EvictionPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 512,
            default_ttl_seconds: 300,
            cleanup_interval_seconds: 60,
            eviction_policy: EvictionPolicy::LeastRecentlyUsed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    LeastRecentlyUsed,
    LeastFrequentlyUsed,
    OldestFirst,
}

// Keywords differing only in case or surrounding whitespace share an entry
pub fn create_cache_key(keyword: &str) -> String {
    keyword.trim().to_lowercase()
}

struct CacheEntry {
    options: Vec<AirportOption>,
    created_at: Instant,
    ttl: Duration,
    access_count: usize,
    last_accessed: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }
}

pub struct AirportCache {
    entries: DashMap<String, CacheEntry>,
    config: RwLock<CacheConfig>,
    stats: CacheStats,
}

impl AirportCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config: RwLock::new(config),
            stats: CacheStats::default(),
        }
    }

    // Returns false when the cache has no capacity at all
    pub fn store(&self, keyword: &str, options: Vec<AirportOption>, ttl: Option<Duration>) -> bool {
        let (max_entries, default_ttl) = {
            let config = self.config.read();
            (
                config.max_entries,
                Duration::from_secs(config.default_ttl_seconds),
            )
        };
        if max_entries == 0 {
            return false;
        }

        let key = create_cache_key(keyword);
        if !self.entries.contains_key(&key) {
            while self.entries.len() >= max_entries {
                if !self.evict_one() {
                    break;
                }
            }
        }

        let now = Instant::now();
        let entry = CacheEntry {
            options,
            created_at: now,
            ttl: ttl.unwrap_or(default_ttl),
            access_count: 0,
            last_accessed: now,
        };
        if self.entries.insert(key, entry).is_none() {
            self.stats.items_count.fetch_add(1, Ordering::SeqCst);
        }
        true
    }

    pub fn get(&self, keyword: &str) -> Option<Vec<AirportOption>> {
        let started = Instant::now();
        let key = create_cache_key(keyword);
        self.stats.total_lookups.fetch_add(1, Ordering::SeqCst);

        let (found, expired) = match self.entries.get_mut(&key) {
            Some(mut entry) if !entry.is_expired() => {
                entry.access_count += 1;
                entry.last_accessed = Instant::now();
                (Some(entry.options.clone()), false)
            }
            Some(_) => (None, true),
            None => (None, false),
        };
        if expired {
            self.remove_expired(&key);
        }

        if found.is_some() {
            self.stats.hit_count.fetch_add(1, Ordering::SeqCst);
        } else {
            self.stats.miss_count.fetch_add(1, Ordering::SeqCst);
        }
        self.store_lookup_time(started);
        found
    }

    pub fn stats(&self) -> CacheStatsReport {
        CacheStatsReport {
            items_count: self.stats.items_count.load(Ordering::SeqCst),
            hit_count: self.stats.hit_count.load(Ordering::SeqCst),
            miss_count: self.stats.miss_count.load(Ordering::SeqCst),
            eviction_count: self.stats.eviction_count.load(Ordering::SeqCst),
            expired_count: self.stats.expired_count.load(Ordering::SeqCst),
            average_lookup_time_ns: self.stats.average_lookup_time_ns.load(Ordering::SeqCst),
            total_lookups: self.stats.total_lookups.load(Ordering::SeqCst),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set_eviction_policy(&self, policy: EvictionPolicy) {
        self.config.write().eviction_policy = policy;
    }

    // Removes every keyword starting with `prefix`, or everything when None
    pub fn invalidate(&self, prefix: Option<&str>) -> usize {
        let prefix = prefix.map(create_cache_key);
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| {
                prefix
                    .as_deref()
                    .map_or(true, |p| entry.key().starts_with(p))
            })
            .map(|entry| entry.key().clone())
            .collect();

        keys.iter()
            .filter(|key| self.remove_entry(key, false))
            .count()
    }

    pub fn resize(&self, max_entries: usize) {
        self.config.write().max_entries = max_entries;
        while self.entries.len() > max_entries {
            if !self.evict_one() {
                break;
            }
        }
    }

    pub fn purge_expired(&self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.value().is_expired())
            .map(|entry| entry.key().clone())
            .collect();

        let purged = expired
            .iter()
            .filter(|key| self.remove_expired(key))
            .count();
        if purged > 0 {
            debug!(purged, "Purged expired airport cache entries");
        }
        purged
    }

    // Periodically purges expired entries until the cache is dropped
    pub fn spawn_cleanup(self: &Arc<Self>) -> JoinHandle<()> {
        let period = Duration::from_secs(self.config.read().cleanup_interval_seconds.max(1));
        let cache = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                match cache.upgrade() {
                    Some(cache) => {
                        cache.purge_expired();
                    }
                    None => break,
                }
            }
        })
    }

    fn evict_one(&self) -> bool {
        let policy = self.config.read().eviction_policy;

        let victim = match policy {
            EvictionPolicy::LeastRecentlyUsed => self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().last_accessed)
                .map(|entry| entry.key().clone()),
            EvictionPolicy::LeastFrequentlyUsed => self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().access_count)
                .map(|entry| entry.key().clone()),
            EvictionPolicy::OldestFirst => self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().created_at)
                .map(|entry| entry.key().clone()),
        };

        match victim {
            Some(key) => {
                debug!(keyword = %key, ?policy, "Evicting airport cache entry");
                self.remove_entry(&key, true);
                true
            }
            None => false,
        }
    }

    // Only capacity evictions count towards eviction_count
    fn remove_entry(&self, key: &str, evicted: bool) -> bool {
        if self.entries.remove(key).is_none() {
            return false;
        }
        self.stats.items_count.fetch_sub(1, Ordering::SeqCst);
        if evicted {
            self.stats.eviction_count.fetch_add(1, Ordering::SeqCst);
        }
        true
    }

    // Re-checks expiry under the shard lock so a fresh concurrent store survives
    fn remove_expired(&self, key: &str) -> bool {
        if self
            .entries
            .remove_if(key, |_, entry| entry.is_expired())
            .is_none()
        {
            return false;
        }
        self.stats.items_count.fetch_sub(1, Ordering::SeqCst);
        self.stats.expired_count.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn store_lookup_time(&self, started: Instant) {
        let duration_ns = started.elapsed().as_nanos() as u64;
        let total_lookups = self.stats.total_lookups.load(Ordering::SeqCst) as u64;
        let current_avg = self.stats.average_lookup_time_ns.load(Ordering::SeqCst);

        let new_avg = if total_lookups <= 1 {
            duration_ns
        } else {
            (current_avg * (total_lookups - 1) + duration_ns) / total_lookups
        };

        self.stats
            .average_lookup_time_ns
            .store(new_avg, Ordering::SeqCst);
    }
}

// Serves repeated keywords from the cache before going to the network
pub struct CachedAirportLookup<L> {
    inner: L,
    cache: Arc<AirportCache>,
}

impl<L: AirportLookup> CachedAirportLookup<L> {
    pub fn new(inner: L, cache: Arc<AirportCache>) -> Self {
        Self { inner, cache }
    }

    pub fn with_config(inner: L, config: CacheConfig) -> Self {
        Self::new(inner, Arc::new(AirportCache::new(config)))
    }

    pub fn cache(&self) -> &Arc<AirportCache> {
        &self.cache
    }
}

#[async_trait]
impl<L: AirportLookup> AirportLookup for CachedAirportLookup<L> {
    async fn search_airports(&self, keyword: &str) -> Result<Vec<AirportOption>, ApiError> {
        if let Some(options) = self.cache.get(keyword) {
            debug!(keyword, "Airport search served from cache");
            return Ok(options);
        }

        let options = self.inner.search_airports(keyword).await?;
        self.cache.store(keyword, options.clone(), None);
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock_server::ScriptedLookup;
    use futures::future::join_all;
    use std::thread;

    fn options(code: &str) -> Vec<AirportOption> {
        vec![AirportOption::new(code, format!("{code} airport"))]
    }

    fn config(max_entries: usize, policy: EvictionPolicy) -> CacheConfig {
        CacheConfig {
            max_entries,
            default_ttl_seconds: 3600,
            cleanup_interval_seconds: 60,
            eviction_policy: policy,
        }
    }

    #[test]
    fn test_keyword_normalization() {
        let cache = AirportCache::new(CacheConfig::default());
        assert!(cache.store("  London ", options("LHR"), None));

        assert_eq!(cache.get("london"), Some(options("LHR")));
        assert_eq!(cache.get("LONDON"), Some(options("LHR")));
        assert_eq!(cache.get("paris"), None);

        let stats = cache.stats();
        assert_eq!(stats.hit_count, 2);
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.total_lookups, 3);
        assert_eq!(stats.total_lookups, stats.hit_count + stats.miss_count);
        assert_eq!(stats.items_count, 1);
    }

    #[test]
    fn test_expiration_and_ttl() {
        let cache = AirportCache::new(CacheConfig::default());
        cache.store("new york", options("JFK"), None);
        cache.store("boston", options("BOS"), Some(Duration::from_millis(50)));

        assert!(cache.get("boston").is_some());
        thread::sleep(Duration::from_millis(100));

        assert!(cache.get("new york").is_some());
        assert!(cache.get("boston").is_none());

        let stats = cache.stats();
        assert_eq!(stats.expired_count, 1);
        assert_eq!(stats.items_count, 1);
    }

    #[test]
    fn test_eviction_policy_lru() {
        let cache = AirportCache::new(config(3, EvictionPolicy::LeastRecentlyUsed));
        for code in ["aaa", "bbb", "ccc"] {
            cache.store(code, options(code), None);
            thread::sleep(Duration::from_millis(2));
        }

        assert!(cache.get("aaa").is_some());
        thread::sleep(Duration::from_millis(2));
        cache.store("ddd", options("ddd"), None);

        assert!(cache.get("bbb").is_none(), "least recently used entry should go");
        assert!(cache.get("aaa").is_some());
        assert!(cache.get("ccc").is_some());
        assert!(cache.get("ddd").is_some());
        assert_eq!(cache.stats().eviction_count, 1);
    }

    #[test]
    fn test_eviction_policy_lfu() {
        let cache = AirportCache::new(config(2, EvictionPolicy::OldestFirst));
        cache.set_eviction_policy(EvictionPolicy::LeastFrequentlyUsed);
        cache.store("aaa", options("aaa"), None);
        cache.store("bbb", options("bbb"), None);

        cache.get("aaa");
        cache.get("aaa");
        cache.get("bbb");
        cache.store("ccc", options("ccc"), None);

        assert!(cache.get("aaa").is_some());
        assert!(cache.get("bbb").is_none());
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let cache = AirportCache::new(config(1, EvictionPolicy::OldestFirst));
        cache.store("aaa", options("aaa"), None);
        cache.store("aaa", options("zzz"), None);

        assert_eq!(cache.get("aaa"), Some(options("zzz")));
        assert_eq!(cache.stats().eviction_count, 0);
        assert_eq!(cache.stats().items_count, 1);
    }

    #[test]
    fn test_invalidate_by_prefix() {
        let cache = AirportCache::new(CacheConfig::default());
        for keyword in ["san", "san fran", "san diego", "seattle"] {
            cache.store(keyword, options("SXX"), None);
        }

        assert_eq!(cache.invalidate(Some("San")), 3);
        assert!(cache.get("seattle").is_some());
        assert!(cache.get("san diego").is_none());

        assert_eq!(cache.invalidate(None), 1);
        let stats = cache.stats();
        assert_eq!(stats.items_count, 0);
        assert_eq!(stats.eviction_count, 0);
    }

    #[test]
    fn test_resize_and_zero_capacity() {
        let cache = AirportCache::new(config(10, EvictionPolicy::OldestFirst));
        for i in 0..10 {
            cache.store(&format!("k{i}"), options("AAA"), None);
            thread::sleep(Duration::from_millis(1));
        }

        cache.resize(4);
        assert_eq!(cache.stats().items_count, 4);
        assert!(cache.get("k9").is_some());
        assert!(cache.get("k0").is_none());

        cache.resize(0);
        assert!(!cache.store("k10", options("AAA"), None));
        assert_eq!(cache.stats().items_count, 0);
    }

    #[test]
    fn test_purge_expired() {
        let cache = AirportCache::new(CacheConfig::default());
        cache.store("short", options("AAA"), Some(Duration::from_millis(10)));
        cache.store("long", options("BBB"), None);
        thread::sleep(Duration::from_millis(30));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.stats().items_count, 1);
    }

    #[test]
    fn test_concurrent_access_with_contention() {
        let cache = Arc::new(AirportCache::new(config(64, EvictionPolicy::LeastRecentlyUsed)));
        let popular = ["lon", "par", "new"];

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for j in 0..500 {
                        let keyword = if rand::random::<f64>() < 0.8 {
                            popular[j % popular.len()].to_string()
                        } else {
                            format!("kw{}", i * 1000 + j)
                        };

                        match j % 10 {
                            0..=7 => {
                                cache.get(&keyword);
                            }
                            8 => {
                                cache.store(&keyword, options("AAA"), None);
                            }
                            _ => {
                                cache.invalidate(Some(&keyword));
                            }
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let stats = cache.stats();
        assert_eq!(stats.total_lookups, 8 * 400);
        assert_eq!(stats.items_count, cache.len());
    }

    #[tokio::test]
    async fn test_cached_lookup_hits_network_once() {
        let lookup = ScriptedLookup::new();
        lookup.respond("rome", Ok(options("FCO")));
        let cached = CachedAirportLookup::new(
            Arc::clone(&lookup),
            Arc::new(AirportCache::new(CacheConfig::default())),
        );

        assert_eq!(cached.search_airports("rome").await.unwrap(), options("FCO"));
        assert_eq!(cached.search_airports("Rome ").await.unwrap(), options("FCO"));
        assert_eq!(lookup.calls(), vec!["rome".to_string()]);
        assert_eq!(cached.cache().stats().hit_count, 1);
    }

    #[tokio::test]
    async fn test_cached_lookup_concurrent_keywords() {
        let lookup = ScriptedLookup::new();
        let cached = CachedAirportLookup::new(
            Arc::clone(&lookup),
            Arc::new(AirportCache::new(CacheConfig::default())),
        );
        let keywords = ["bos", "sfo", "ord"];

        let first = join_all(keywords.iter().map(|k| cached.search_airports(k))).await;
        assert!(first.iter().all(|r| r.is_ok()));
        assert_eq!(cached.cache().len(), 3);

        let second = join_all(keywords.iter().map(|k| cached.search_airports(k))).await;
        assert_eq!(first, second);
        assert_eq!(lookup.calls().len(), 3);
        assert_eq!(cached.cache().stats().hit_count, 3);
    }

    #[tokio::test]
    async fn test_cached_lookup_does_not_store_errors() {
        let lookup = ScriptedLookup::new();
        lookup.respond("zzz", Err(ApiError::NetworkError("down".to_string())));
        let config = crate::config::ClientConfig::new("http://localhost:5000").unwrap();
        let cached = CachedAirportLookup::with_config(Arc::clone(&lookup), config.airport_cache);

        assert!(cached.search_airports("zzz").await.is_err());
        assert!(cached.search_airports("zzz").await.is_err());
        assert_eq!(lookup.calls().len(), 2);
        assert_eq!(cached.cache().stats().items_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_stops_with_cache() {
        let cache = Arc::new(AirportCache::new(CacheConfig {
            cleanup_interval_seconds: 1,
            ..CacheConfig::default()
        }));
        let handle = cache.spawn_cleanup();
        drop(cache);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(handle.is_finished());
    }
}
