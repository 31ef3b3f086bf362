//! In-process memory tier
//!
//! A Moka-backed cache keyed by string with an independent TTL per entry.
//! Capacity-bounded; expired entries are never served. Pattern invalidation
//! walks the live entries with a compiled [`GlobPattern`] predicate.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;

use crate::{CacheError, GlobPattern};

/// A stored value together with its retention
struct MemoryEntry<V> {
    value: Arc<V>,
    ttl: Duration,
}

impl<V> Clone for MemoryEntry<V> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            ttl: self.ttl,
        }
    }
}

/// Expiry policy that reads the TTL stored with each entry
struct EntryTtl;

impl<V> Expiry<String, MemoryEntry<V>> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &MemoryEntry<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &MemoryEntry<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // An overwrite fully replaces the entry, retention included
        Some(entry.ttl)
    }
}

/// Memory tier of the two-tier cache
pub struct MemoryCache<V> {
    entries: Cache<String, MemoryEntry<V>>,
    default_ttl: Duration,
}

impl<V> Clone for MemoryCache<V>
where
    V: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            default_ttl: self.default_ttl,
        }
    }
}

impl<V> MemoryCache<V>
where
    V: Send + Sync + 'static,
{
    /// Create a memory tier with the given capacity and default retention
    pub fn new(max_capacity: u64, default_ttl: Duration) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryTtl)
            .support_invalidation_closures()
            .build();

        Self {
            entries,
            default_ttl,
        }
    }

    /// Look up a live entry
    pub async fn get(&self, key: &str) -> Option<Arc<V>> {
        self.entries.get(key).await.map(|entry| entry.value)
    }

    /// Store a value, replacing any previous entry for the key
    ///
    /// `ttl` of `None` falls back to the configured default retention.
    pub async fn insert(&self, key: &str, value: Arc<V>, ttl: Option<Duration>) {
        let entry = MemoryEntry {
            value,
            ttl: ttl.unwrap_or(self.default_ttl),
        };
        self.entries.insert(key.to_owned(), entry).await;
    }

    /// Remove a single entry
    pub async fn invalidate(&self, key: &str) {
        self.entries.invalidate(key).await;
    }

    /// Remove every entry whose key matches the pattern
    pub fn invalidate_pattern(&self, pattern: &GlobPattern) -> Result<(), CacheError> {
        let matcher = pattern.matcher();
        self.entries
            .invalidate_entries_if(move |key, _entry| matcher.is_match(key))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache: MemoryCache<String> = MemoryCache::new(100, Duration::from_secs(60));

        cache
            .insert("park:mk", Arc::new("Magic Kingdom".to_owned()), None)
            .await;

        assert_eq!(
            cache.get("park:mk").await.as_deref(),
            Some(&"Magic Kingdom".to_owned())
        );
        assert!(cache.get("park:ak").await.is_none());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value() {
        let cache: MemoryCache<u32> = MemoryCache::new(100, Duration::from_secs(60));

        cache.insert("waittime:1", Arc::new(10), None).await;
        cache.insert("waittime:1", Arc::new(45), None).await;

        assert_eq!(cache.get("waittime:1").await.as_deref(), Some(&45));
    }

    #[tokio::test]
    async fn test_per_entry_ttl_expires() {
        let cache: MemoryCache<u32> = MemoryCache::new(100, Duration::from_secs(60));

        cache
            .insert("waittime:1", Arc::new(10), Some(Duration::from_millis(50)))
            .await;
        assert!(cache.get("waittime:1").await.is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(cache.get("waittime:1").await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_pattern_removes_matches_only() {
        let cache: MemoryCache<u32> = MemoryCache::new(100, Duration::from_secs(60));

        cache.insert("park:mk", Arc::new(1), None).await;
        cache.insert("park:mk:details", Arc::new(2), None).await;
        cache.insert("park:ak", Arc::new(3), None).await;

        let pattern = GlobPattern::compile("park:mk*").unwrap();
        cache.invalidate_pattern(&pattern).unwrap();

        assert!(cache.get("park:mk").await.is_none());
        assert!(cache.get("park:mk:details").await.is_none());
        assert_eq!(cache.get("park:ak").await.as_deref(), Some(&3));
    }
}
