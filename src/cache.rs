//! In-process cache of resolved regions
//!
//! The cache is constructed explicitly and handed to the resolver. Entries
//! are keyed by normalized name plus state and expire after the configured
//! TTL; a zero TTL keeps them until [`RegionCache::clear`] or process exit.

use crate::models::Region;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

struct StoredEntry {
    value: Arc<Region>,
    expires_at: Option<Instant>,
}

impl StoredEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| now < deadline)
    }
}

/// Thread-safe, read-mostly region lookup cache
pub struct RegionCache {
    entries: RwLock<HashMap<String, StoredEntry>>,
    ttl: Option<Duration>,
}

impl Default for RegionCache {
    fn default() -> Self {
        Self::new(None)
    }
}

impl std::fmt::Debug for RegionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionCache")
            .field("entries", &self.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl RegionCache {
    /// Create a cache; `None` means entries never expire
    #[must_use]
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Build from a TTL in seconds, 0 meaning no expiry
    #[must_use]
    pub fn with_ttl_seconds(seconds: u64) -> Self {
        Self::new((seconds > 0).then(|| Duration::from_secs(seconds)))
    }

    /// Retrieves a region if it exists and has not expired.
    #[tracing::instrument(name = "query_region_cache", level = "debug", skip(self))]
    pub fn get(&self, key: &str) -> Option<Arc<Region>> {
        let now = Instant::now();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if entry.is_fresh(now) => {
                tracing::debug!("Key found and still fresh");
                Some(Arc::clone(&entry.value))
            }
            Some(_) => {
                tracing::debug!("Key found but expired");
                None
            }
            None => {
                tracing::debug!("Key not found");
                None
            }
        }
    }

    /// Stores a region; concurrent writers of the same key store equal values.
    #[tracing::instrument(name = "put_region_cache", level = "debug", skip(self, value))]
    pub fn put(&self, key: &str, value: Arc<Region>) {
        let expires_at = self.ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), StoredEntry { value, expires_at });
    }

    /// Manually removes a key from the cache.
    pub fn remove(&self, key: &str) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
    }

    /// Drops every entry
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let dropped = entries.len();
        entries.clear();
        tracing::debug!(dropped, "Region cache cleared");
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegionKind;
    use geo::MultiPolygon;

    fn region(name: &str) -> Arc<Region> {
        Arc::new(Region {
            kind: RegionKind::State,
            name: name.to_string(),
            state_code: "IL".to_string(),
            fips: "17".to_string(),
            boundary: MultiPolygon(vec![]),
        })
    }

    #[test]
    fn test_put_and_get() {
        let cache = RegionCache::default();
        assert!(cache.get("state:illinois:IL").is_none());

        cache.put("state:illinois:IL", region("Illinois"));
        let hit = cache.get("state:illinois:IL").unwrap();
        assert_eq!(hit.name, "Illinois");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let cache = RegionCache::default();
        cache.put("k", region("Illinois"));
        cache.put("k", region("Illinois"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entries_are_misses() {
        let cache = RegionCache::new(Some(Duration::from_millis(1)));
        cache.put("k", region("Illinois"));
        std::thread::sleep(Duration::from_millis(10));
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn test_clear_and_remove() {
        let cache = RegionCache::with_ttl_seconds(0);
        cache.put("a", region("A"));
        cache.put("b", region("B"));
        cache.remove("a");
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        cache.clear();
        assert!(cache.is_empty());
    }
}
