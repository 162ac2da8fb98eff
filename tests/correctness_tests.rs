//! Correctness Tests for the LIRS Cache
//!
//! Validates the replacement policy with small, deterministic workloads. Each
//! test spells out which entries are hot, cold or history after the
//! operations it performs.
//!
//! ## Test Strategy
//! - Small budgets with unit-cost entries so every eviction is predictable
//! - `stack_move_distance` of 0 so every hit moves hot entries
//! - `check_invariants` after every mutating step that matters

use lirs_cache::config::LirsCacheConfig;
use lirs_cache::metrics::CacheMetrics;
use lirs_cache::{LirsCache, LirsError};

// ============================================================================
// HELPER FUNCTIONS FOR CACHE CREATION
// ============================================================================

/// Unit-cost cache with the given budget and no stack move throttling.
fn make_lirs<K: std::hash::Hash + Eq + Clone, V>(max_memory: u64) -> LirsCache<K, V> {
    let config = LirsCacheConfig::new(max_memory).with_stack_move_distance(0);
    LirsCache::init(config, None).unwrap()
}

fn is_hot<V>(cache: &LirsCache<u32, V>, key: u32) -> bool {
    cache.contains_key(&key) && !cache.keys(true, false).contains(&key)
}

// ============================================================================
// BASIC REPLACEMENT
// ============================================================================

#[test]
fn test_lirs_evicts_oldest_when_full() {
    let mut cache = make_lirs(3);
    cache.put(1, "a");
    cache.put(2, "b");
    cache.put(3, "c");
    cache.put(4, "d");

    assert_eq!(cache.get(&1), None, "key 1 should be evicted");
    assert_eq!(cache.get(&4), Some(&"d"));
    assert_eq!(cache.len(), 3);
    assert_eq!(cache.used_memory(), 3);
    cache.check_invariants().unwrap();
}

#[test]
fn test_lirs_new_entry_is_cold_when_full() {
    let mut cache = make_lirs(3);
    for key in 1..=4 {
        cache.put(key, key);
    }

    assert_eq!(cache.keys(false, false), vec![4, 3, 2]);
    assert_eq!(cache.keys(true, false), vec![4]);
    assert_eq!(cache.keys(true, true), vec![1]);
    assert_eq!(cache.size_hot(), 2);
    assert_eq!(cache.size_non_resident(), 1);
}

#[test]
fn test_lirs_cold_hit_on_stack_becomes_hot() {
    let mut cache = make_lirs(3);
    for key in 1..=4 {
        cache.put(key, key);
    }

    // 4 is cold but still on the stack: a hit makes it hot and demotes the
    // oldest hot entry.
    assert_eq!(cache.get(&4), Some(&4));
    assert!(is_hot(&cache, 4));
    assert_eq!(cache.keys(true, false), vec![2]);
    assert_eq!(cache.keys(false, false), vec![4, 3]);
    assert_eq!(cache.size_hot(), 2);
    cache.check_invariants().unwrap();
}

#[test]
fn test_lirs_peek_does_not_change_state() {
    let mut cache = make_lirs(3);
    for key in 1..=4 {
        cache.put(key, key);
    }

    assert_eq!(cache.peek(&4), Some(&4));
    assert!(cache.contains_key(&4));
    assert_eq!(cache.keys(true, false), vec![4]);
    assert_eq!(cache.keys(false, false), vec![4, 3, 2]);
    assert_eq!(cache.metrics()["requests"], 0.0);
}

// ============================================================================
// SCAN RESISTANCE
// ============================================================================

#[test]
fn test_lirs_scan_does_not_evict_hot_entries() {
    let mut cache = make_lirs(10);

    // Bring the cache to its steady state with unrelated entries.
    for key in 5000..5010 {
        cache.put(key, key);
    }
    for key in [1, 2] {
        cache.put(key, key);
        for _ in 0..3 {
            assert_eq!(cache.get(&key), Some(&key));
        }
    }
    assert!(is_hot(&cache, 1));
    assert!(is_hot(&cache, 2));

    for key in 10..=1000 {
        cache.put(key, key);
        assert!(cache.used_memory() <= 10);
    }

    assert_eq!(cache.get(&1), Some(&1));
    assert_eq!(cache.get(&2), Some(&2));
    assert!(cache.size_non_resident() > 0);
    cache.check_invariants().unwrap();
}

#[test]
fn test_lirs_scan_only_churns_cold_queue() {
    let mut cache = make_lirs(10);
    for key in 5000..5010 {
        cache.put(key, key);
    }
    assert_eq!(cache.size_hot(), 10);

    // The first overflow demotes one hot entry to seed the cold queue.
    cache.put(10, 10);
    assert_eq!(cache.size_hot(), 9);

    for key in 11..=1000 {
        cache.put(key, key);
    }

    assert_eq!(cache.size_hot(), 9);
    // Only the most recent scanned key survives in the cold queue.
    assert_eq!(cache.keys(true, false), vec![1000]);
    assert!(!cache.contains_key(&999));
}

// ============================================================================
// HISTORY
// ============================================================================

#[test]
fn test_lirs_returning_key_becomes_hot() {
    let mut cache = make_lirs(10);
    cache.put(1, "a");
    for key in 100..110 {
        cache.put(key, "filler");
    }

    assert_eq!(cache.get(&1), None);
    assert_eq!(cache.keys(true, true), vec![1]);

    // Re-inserted as a cold entry on the stack
    cache.put(1, "a");
    assert!(cache.contains_key(&1));
    assert!(!is_hot(&cache, 1));
    assert_eq!(cache.size_non_resident(), 1);

    // One more reference while it is on the stack promotes it.
    assert_eq!(cache.get(&1), Some(&"a"));
    assert!(is_hot(&cache, 1));
    assert_eq!(cache.keys(true, false), vec![100]);
    cache.check_invariants().unwrap();
}

#[test]
fn test_lirs_history_is_bounded() {
    let mut cache = make_lirs(10);
    for key in 0..10_000 {
        cache.put(key, key);
        assert!(cache.size_non_resident() * 2 <= cache.keys(false, false).len());
    }
    assert_eq!(cache.len(), 10);
    cache.check_invariants().unwrap();
}

#[test]
fn test_lirs_remove_forgets_history() {
    let mut cache = make_lirs(3);
    for key in 1..=4 {
        cache.put(key, key);
    }
    assert_eq!(cache.size_non_resident(), 1);

    assert_eq!(cache.remove(&1), None);
    assert_eq!(cache.size_non_resident(), 0);
    assert_eq!(cache.len(), 3);
    cache.check_invariants().unwrap();
}

// ============================================================================
// REMOVAL
// ============================================================================

#[test]
fn test_lirs_remove_hot_keeps_hot_count() {
    let mut cache = make_lirs(5);
    for key in 1..=7 {
        cache.put(key, key);
    }
    assert_eq!(cache.size_hot(), 4);
    assert_eq!(cache.keys(true, false), vec![7]);

    assert_eq!(cache.remove(&5), Some(5));

    // The newest cold entry took over.
    assert_eq!(cache.size_hot(), 4);
    assert!(is_hot(&cache, 7));
    assert!(cache.keys(true, false).is_empty());
    assert_eq!(cache.used_memory(), 4);
    cache.check_invariants().unwrap();
}

#[test]
fn test_lirs_remove_cold_promoted_from_stack() {
    let mut cache = make_lirs(3);
    for key in 1..=4 {
        cache.put(key, key);
    }
    cache.get(&4);
    // stack [4, 3], cold queue [2]
    assert_eq!(cache.remove(&3), Some(3));
    assert_eq!(cache.size_hot(), 2);
    assert!(is_hot(&cache, 2));
    cache.check_invariants().unwrap();
}

#[test]
fn test_lirs_remove_missing() {
    let mut cache: LirsCache<u32, u32> = make_lirs(3);
    assert_eq!(cache.remove(&42), None);
    cache.put(1, 1);
    assert_eq!(cache.remove(&42), None);
    assert_eq!(cache.len(), 1);
}

// ============================================================================
// MEMORY ACCOUNTING
// ============================================================================

#[test]
fn test_lirs_weighted_entries() {
    let mut cache = make_lirs(100);
    cache.put_with_memory("a", 1, 40);
    cache.put_with_memory("b", 2, 40);
    assert_eq!(cache.used_memory(), 80);

    // "a" is demoted, evicted and its history dropped right away.
    cache.put_with_memory("c", 3, 30);
    assert_eq!(cache.used_memory(), 70);
    assert_eq!(cache.get_memory(&"a"), 0);
    assert_eq!(cache.get_memory(&"b"), 40);
    assert_eq!(cache.get_memory(&"c"), 30);
    assert_eq!(cache.size_non_resident(), 0);

    cache.put_with_memory("d", 4, 10);
    assert_eq!(cache.used_memory(), 80);
    assert_eq!(cache.len(), 3);
    cache.check_invariants().unwrap();
}

#[test]
fn test_lirs_put_replaces_value_and_memory() {
    let mut cache = make_lirs(100);
    assert_eq!(cache.put_with_memory(1, "a", 10), None);
    assert_eq!(cache.put_with_memory(1, "b", 25), Some("a"));
    assert_eq!(cache.get(&1), Some(&"b"));
    assert_eq!(cache.get_memory(&1), 25);
    assert_eq!(cache.used_memory(), 25);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_lirs_average_memory_applies_to_put() {
    let config = LirsCacheConfig::new(1000).with_average_memory(100);
    let mut cache: LirsCache<u32, u32> = LirsCache::init(config, None).unwrap();
    for key in 0..20 {
        cache.put(key, key);
    }
    assert_eq!(cache.get_memory(&19), 100);
    assert!(cache.used_memory() <= 1000);
    assert_eq!(cache.len(), 10);
}

#[test]
fn test_lirs_oversized_entry_is_kept() {
    let mut cache = make_lirs(10);
    cache.put_with_memory(1, "huge", 50);
    assert_eq!(cache.get(&1), Some(&"huge"));
    assert_eq!(cache.used_memory(), 50);
    cache.check_invariants().unwrap();
}

#[test]
fn test_lirs_set_max_memory_applies_on_next_put() {
    let mut cache = make_lirs(10);
    for key in 0..10 {
        cache.put(key, key);
    }
    cache.set_max_memory(5).unwrap();
    assert_eq!(cache.max_memory(), 5);
    assert_eq!(cache.len(), 10, "nothing is evicted by the setter");

    cache.put(10, 10);
    assert_eq!(cache.keys(true, true), vec![0]);
    cache.check_invariants().unwrap();
}

#[test]
fn test_lirs_setters_reject_zero() {
    let mut cache: LirsCache<u32, u32> = make_lirs(10);
    assert!(matches!(
        cache.set_max_memory(0),
        Err(LirsError::InvalidConfiguration(_))
    ));
    assert!(cache.set_average_memory(0).is_err());
    assert_eq!(cache.max_memory(), 10);
    assert_eq!(cache.average_memory(), 1);

    cache.set_average_memory(4).unwrap();
    cache.put(1, 1);
    assert_eq!(cache.get_memory(&1), 4);
}

// ============================================================================
// CONSTRUCTION, CLEAR, VIEWS
// ============================================================================

#[test]
fn test_lirs_invalid_configs() {
    let result: Result<LirsCache<u32, u32>, _> = LirsCache::init(LirsCacheConfig::new(0), None);
    assert!(result.is_err());

    let config = LirsCacheConfig::new(10).with_average_memory(0);
    let result: Result<LirsCache<u32, u32>, _> = LirsCache::init(config, None);
    assert!(result.is_err());

    let config = LirsCacheConfig::new(10).with_cold_ratio_shift(40);
    let result: Result<LirsCache<u32, u32>, _> = LirsCache::init(config, None);
    assert!(result.is_err());

    assert!(LirsCache::<u32, u32>::new(0).is_err());
}

#[test]
fn test_lirs_clear() {
    let mut cache = make_lirs(10);
    for key in 0..50 {
        cache.put(key, key);
    }
    cache.get(&49);
    cache.clear();

    assert!(cache.is_empty());
    assert_eq!(cache.used_memory(), 0);
    assert_eq!(cache.size_hot(), 0);
    assert_eq!(cache.size_non_resident(), 0);
    assert!(cache.size_map_array() >= 8);
    // Metrics survive a clear.
    assert_eq!(cache.metrics()["insertions"], 50.0);

    cache.put(1, 1);
    assert_eq!(cache.get(&1), Some(&1));
    cache.check_invariants().unwrap();
}

#[test]
fn test_lirs_key_set_and_entries() {
    let mut cache = make_lirs(3);
    for key in 1..=4 {
        cache.put(key, key * 10);
    }

    let mut keys = cache.key_set();
    keys.sort_unstable();
    assert_eq!(keys, vec![2, 3, 4]);

    let mut entries = cache.entries();
    entries.sort_unstable();
    assert_eq!(entries, vec![(2, 20), (3, 30), (4, 40)]);
}

#[test]
fn test_lirs_string_keys_borrowed_lookup() {
    let mut cache: LirsCache<String, usize> = make_lirs(10);
    cache.put("alpha".to_string(), 1);
    cache.put("beta".to_string(), 2);
    assert_eq!(cache.get("alpha"), Some(&1));
    assert!(cache.contains_key("beta"));
    assert_eq!(cache.remove("beta"), Some(2));
    assert_eq!(cache.get_memory("beta"), 0);
}

// ============================================================================
// STACK MOVE THROTTLING
// ============================================================================

#[test]
fn test_lirs_stack_move_distance() {
    let config = LirsCacheConfig::new(100).with_stack_move_distance(5);
    let mut cache: LirsCache<u32, u32> = LirsCache::init(config, None).unwrap();
    for key in 0..10 {
        cache.put(key, key);
    }
    cache.get(&0);
    assert_eq!(cache.keys(false, false)[0], 0, "moved long ago, promoted");

    let config = LirsCacheConfig::new(100).with_stack_move_distance(20);
    let mut cache: LirsCache<u32, u32> = LirsCache::init(config, None).unwrap();
    for key in 0..10 {
        cache.put(key, key);
    }
    cache.get(&0);
    assert_eq!(cache.keys(false, false)[0], 9, "moved recently, left in place");
    assert_eq!(cache.get(&0), Some(&0));
}

// ============================================================================
// METRICS
// ============================================================================

#[test]
fn test_lirs_metrics() {
    let mut cache = make_lirs(3);
    for key in 1..=4 {
        cache.put(key, key);
    }
    cache.get(&4);
    cache.get(&1);
    cache.get(&99);

    let metrics = cache.metrics();
    assert_eq!(metrics["requests"], 3.0);
    assert_eq!(metrics["cache_hits"], 1.0);
    assert_eq!(metrics["non_resident_hits"], 1.0);
    assert_eq!(metrics["insertions"], 4.0);
    assert_eq!(metrics["evictions"], 1.0);
    assert_eq!(metrics["hot_promotions"], 1.0);
    assert_eq!(metrics["used_memory"], 3.0);
    assert_eq!(cache.algorithm_name(), "LIRS");
}
