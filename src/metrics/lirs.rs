//! LIRS Cache Metrics
//!
//! Metrics specific to the LIRS (Low Inter-reference Recency Set) algorithm.

extern crate alloc;

use super::{CacheMetrics, CoreCacheMetrics};
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use core::sync::atomic::{AtomicU64, Ordering};

/// LIRS-specific metrics (extends CoreCacheMetrics)
#[derive(Debug, Default)]
pub struct LirsCacheMetrics {
    /// Core metrics common to all cache algorithms
    pub core: CoreCacheMetrics,

    /// Cold entries that became hot because they were referenced again while
    /// still on the recency stack.
    pub hot_promotions: u64,

    /// Hot entries converted to cold to keep the minimum cold fraction.
    pub hot_demotions: u64,

    /// Non-resident history entries dropped to bound the history size.
    pub history_drops: u64,

    /// Lookups that found only a non-resident history entry.
    non_resident_hits: AtomicU64,
}

impl LirsCacheMetrics {
    /// Records a lookup that hit a history entry; counted as a miss.
    pub fn record_non_resident_hit(&self) {
        self.core.record_miss();
        self.non_resident_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Lookups that found only a history entry.
    pub fn non_resident_hits(&self) -> u64 {
        self.non_resident_hits.load(Ordering::Relaxed)
    }

    /// Converts LIRS metrics to a BTreeMap for reporting
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.core.to_btreemap();
        metrics.insert("hot_promotions".to_string(), self.hot_promotions as f64);
        metrics.insert("hot_demotions".to_string(), self.hot_demotions as f64);
        metrics.insert("history_drops".to_string(), self.history_drops as f64);
        metrics.insert(
            "non_resident_hits".to_string(),
            self.non_resident_hits() as f64,
        );
        metrics
    }
}

impl CacheMetrics for LirsCacheMetrics {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.to_btreemap()
    }

    fn algorithm_name(&self) -> &'static str {
        "LIRS"
    }
}
