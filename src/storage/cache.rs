//! Read-through entity cache
//!
//! Sits in front of a collection's map when caching is switched on. Lookups
//! by id are answered from the cache while the entry is younger than the
//! configured time to live; every write through the collection refreshes or
//! drops the cached copy, so a hit never returns data the map no longer has.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::sync::Cache;

use super::collection::Keyed;

/// Default time to live for cached entities
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

const MAX_ENTRIES: u64 = 10_000;

/// Hit and miss counters of one or more caches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

impl CacheStats {
    /// Share of lookups answered from the cache, in percent
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            return 0.0;
        }
        self.hits as f64 * 100.0 / lookups as f64
    }
}

impl std::ops::Add for CacheStats {
    type Output = CacheStats;

    fn add(self, rhs: CacheStats) -> CacheStats {
        CacheStats {
            hits: self.hits + rhs.hits,
            misses: self.misses + rhs.misses,
            entries: self.entries + rhs.entries,
        }
    }
}

pub(crate) struct ReadCache<V: Keyed> {
    entries: Cache<V::Key, V>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V> ReadCache<V>
where
    V: Keyed + Clone + Send + Sync + 'static,
{
    pub(crate) fn new(ttl: Duration) -> Self {
        Self {
            entries: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(MAX_ENTRIES)
                .build(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub(crate) fn get(&self, key: &V::Key) -> Option<V> {
        let found = self.entries.get(key);
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub(crate) fn put(&self, item: &V) {
        self.entries.insert(item.key(), item.clone());
    }

    pub(crate) fn forget(&self, key: &V::Key) {
        self.entries.invalidate(key);
    }

    pub(crate) fn clear(&self) {
        self.entries.invalidate_all();
    }

    pub(crate) fn stats(&self) -> CacheStats {
        self.entries.run_pending_tasks();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.entry_count(),
        }
    }
}
