// In-memory response cache with per-entry expiry

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

struct CacheEntry<V> {
    value: Arc<V>,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Snapshot of cache state for health reporting
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CacheStats {
    pub enabled: bool,
    /// Live (unexpired) entries
    pub size: usize,
    pub ttl_seconds: u64,
    pub keys: Vec<String>,
}

/// Key/value store with a deployment-wide TTL.
///
/// Values are stored behind `Arc` and replaced wholesale on `set`, so a reader
/// racing a writer sees either the old value or the new one. Disabling the
/// cache bypasses it without dropping stored entries.
pub struct ResponseCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
    enabled: AtomicBool,
}

impl<V> ResponseCache<V> {
    pub fn new(ttl: Duration, enabled: bool) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            enabled: AtomicBool::new(enabled),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
        tracing::info!(enabled, "cache toggled");
    }

    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        if !self.is_enabled() {
            return None;
        }

        let now = Instant::now();
        {
            let entry = self.entries.get(key)?;
            if entry.is_live(now) {
                return Some(Arc::clone(&entry.value));
            }
        }

        // Expired: purge lazily. The guard above must be released first.
        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        None
    }

    /// Store `value` under `key` for the configured TTL
    pub fn set(&self, key: impl Into<String>, value: V) {
        if !self.is_enabled() {
            return;
        }
        self.entries.insert(
            key.into(),
            CacheEntry {
                value: Arc::new(value),
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drop every entry, returning how many were removed
    pub fn clear(&self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        tracing::info!(removed, "cache cleared");
        removed
    }

    /// Remove expired entries
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.entries.len())
    }

    pub fn stats(&self) -> CacheStats {
        self.purge_expired();
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        CacheStats {
            enabled: self.is_enabled(),
            size: keys.len(),
            ttl_seconds: self.ttl.as_secs(),
            keys,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_value_visible_until_ttl_elapses() {
        let cache = ResponseCache::new(Duration::from_secs(60), true);
        cache.set("video:abc", 42u32);

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get("video:abc").as_deref(), Some(&42));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("video:abc"), None);
        assert_eq!(cache.stats().size, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_bypasses_without_wiping() {
        let cache = ResponseCache::new(Duration::from_secs(60), true);
        cache.set("a", "first".to_string());

        cache.set_enabled(false);
        assert!(cache.get("a").is_none());
        cache.set("b", "ignored".to_string());

        cache.set_enabled(true);
        assert_eq!(cache.get("a").as_deref().map(String::as_str), Some("first"));
        assert!(cache.get("b").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_replaces_and_restarts_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(10), true);
        cache.set("k", 1);
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set("k", 2);
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get("k").as_deref(), Some(&2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_and_clear() {
        let cache = ResponseCache::new(Duration::from_secs(30), true);
        cache.set("b", 1);
        cache.set("a", 2);

        let stats = cache.stats();
        assert!(stats.enabled);
        assert_eq!(stats.size, 2);
        assert_eq!(stats.ttl_seconds, 30);
        assert_eq!(stats.keys, vec!["a".to_string(), "b".to_string()]);

        assert_eq!(cache.clear(), 2);
        assert!(cache.get("a").is_none());
    }

    #[tokio::test]
    async fn test_concurrent_readers_see_whole_values() {
        let cache = Arc::new(ResponseCache::new(Duration::from_secs(60), true));
        let mut handles = Vec::new();
        for i in 0..8u64 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                for j in 0..200u64 {
                    cache.set("shared", vec![i * 1000 + j; 16]);
                    if let Some(v) = cache.get("shared") {
                        assert!(v.iter().all(|x| *x == v[0]));
                    }
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }
}
