//! Cache Metrics System
//!
//! Metrics are reported as a `BTreeMap<String, f64>` so that reports list the
//! same keys in the same order every time, which keeps simulator output and
//! test expectations stable.
//!
//! Request counters are atomics: a concurrent cache records hits from `get`
//! while holding only a segment's read lock. Everything else is updated under
//! exclusive access.

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use core::sync::atomic::{AtomicU64, Ordering};

pub mod lirs;

pub use lirs::LirsCacheMetrics;

/// Counters every cache keeps.
#[derive(Debug, Default)]
pub struct CoreCacheMetrics {
    requests: AtomicU64,
    cache_hits: AtomicU64,
    bytes_served_from_cache: AtomicU64,

    /// Number of entries inserted through `put`.
    pub insertions: u64,

    /// Total memory declared by inserted entries.
    pub bytes_written_to_cache: u64,

    /// Number of entries whose value was dropped to stay within the budget.
    pub evictions: u64,

    /// Total memory released by evictions.
    pub bytes_evicted: u64,
}

impl CoreCacheMetrics {
    /// Records a lookup that found a resident value of the given memory.
    pub fn record_hit(&self, memory: u64) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        self.bytes_served_from_cache
            .fetch_add(memory, Ordering::Relaxed);
    }

    /// Records a lookup that found no resident value.
    pub fn record_miss(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an inserted entry.
    pub fn record_insertion(&mut self, memory: u64) {
        self.insertions += 1;
        self.bytes_written_to_cache = self.bytes_written_to_cache.saturating_add(memory);
    }

    /// Records an entry whose value was dropped to free memory.
    pub fn record_eviction(&mut self, memory: u64) {
        self.evictions += 1;
        self.bytes_evicted = self.bytes_evicted.saturating_add(memory);
    }

    /// Total lookups.
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Lookups that found a resident value.
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// Total memory of values returned by lookups.
    pub fn bytes_served_from_cache(&self) -> u64 {
        self.bytes_served_from_cache.load(Ordering::Relaxed)
    }

    /// Hit rate between 0.0 and 1.0, or 0.0 if nothing was requested.
    pub fn hit_rate(&self) -> f64 {
        hit_rate(self.cache_hits(), self.requests())
    }

    /// Convert core metrics to BTreeMap for reporting
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let requests = self.requests();
        let hits = self.cache_hits();
        let mut metrics = BTreeMap::new();

        metrics.insert("requests".to_string(), requests as f64);
        metrics.insert("cache_hits".to_string(), hits as f64);
        metrics.insert(
            "cache_misses".to_string(),
            requests.saturating_sub(hits) as f64,
        );
        metrics.insert("hit_rate".to_string(), hit_rate(hits, requests));
        metrics.insert(
            "bytes_served_from_cache".to_string(),
            self.bytes_served_from_cache() as f64,
        );
        metrics.insert("insertions".to_string(), self.insertions as f64);
        metrics.insert(
            "bytes_written_to_cache".to_string(),
            self.bytes_written_to_cache as f64,
        );
        metrics.insert("evictions".to_string(), self.evictions as f64);
        metrics.insert("bytes_evicted".to_string(), self.bytes_evicted as f64);

        metrics
    }
}

/// Ratio of hits to requests, 0.0 when there were no requests.
pub fn hit_rate(hits: u64, requests: u64) -> f64 {
    if requests > 0 {
        hits as f64 / requests as f64
    } else {
        0.0
    }
}

/// Uniform metrics interface.
///
/// The simulator uses it to report and compare caches.
pub trait CacheMetrics {
    /// Returns all metrics as key-value pairs in deterministic order.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Algorithm name for identification, e.g. `"LIRS"`.
    fn algorithm_name(&self) -> &'static str;
}
