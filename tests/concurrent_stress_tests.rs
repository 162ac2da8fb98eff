//! Stress Tests for the Concurrent LIRS Cache
//!
//! These tests verify thread safety and bookkeeping under high contention.
//! Workers borrow the cache directly through a scoped thread pool.

#![cfg(feature = "concurrent")]

use lirs_cache::config::{ConcurrentCacheConfig, ConcurrentLirsCacheConfig, LirsCacheConfig};
use lirs_cache::metrics::CacheMetrics;
use lirs_cache::ConcurrentLirsCache;
use scoped_threadpool::Pool;
use std::sync::atomic::{AtomicUsize, Ordering};

const NUM_THREADS: u32 = 16;
const OPS_PER_THREAD: usize = 10_000;

fn lirs_config(max_memory: u64, segments: usize, distance: u64) -> ConcurrentLirsCacheConfig {
    ConcurrentCacheConfig {
        base: LirsCacheConfig::new(max_memory).with_stack_move_distance(distance),
        segments,
    }
}

fn make_cache(max_memory: u64, segments: usize, distance: u64) -> ConcurrentLirsCache<usize, usize> {
    ConcurrentLirsCache::init(lirs_config(max_memory, segments, distance), None).unwrap()
}

/// Test high contention with many threads hammering the same keys
#[test]
fn stress_lirs_high_contention() {
    let cache = make_cache(100, 16, 0);
    let mut pool = Pool::new(NUM_THREADS);

    pool.scoped(|scope| {
        for t in 0..NUM_THREADS as usize {
            let cache = &cache;
            scope.execute(move || {
                for i in 0..OPS_PER_THREAD {
                    let key = i % 50;
                    if i % 2 == 0 {
                        cache.put(key, t * OPS_PER_THREAD + i);
                    } else {
                        let _ = cache.get(&key);
                    }
                }
            });
        }
    });

    assert!(cache.len() <= 50);
    assert!(cache.used_memory() <= 100);
    cache.check_invariants().unwrap();
}

/// Many threads writing disjoint key ranges through a small cache.
#[test]
fn stress_lirs_eviction_churn() {
    let cache = make_cache(512, 8, 0);
    let mut pool = Pool::new(NUM_THREADS);

    pool.scoped(|scope| {
        for t in 0..NUM_THREADS as usize {
            let cache = &cache;
            scope.execute(move || {
                for i in 0..OPS_PER_THREAD {
                    let key = t * OPS_PER_THREAD + i;
                    cache.put(key, i);
                    if i % 3 == 0 {
                        let _ = cache.get(&(key / 2));
                    }
                }
            });
        }
    });

    assert!(cache.used_memory() <= 512);
    let metrics = cache.metrics();
    assert_eq!(
        metrics["insertions"],
        (NUM_THREADS as usize * OPS_PER_THREAD) as f64
    );
    assert!(metrics["evictions"] > 0.0);
    cache.check_invariants().unwrap();
}

/// Mixed operations with throttled stack moves, so most hits stay on the
/// read-lock path.
#[test]
fn stress_lirs_read_mostly() {
    let cache = make_cache(4_096, 16, 64);
    for key in 0..2_048 {
        cache.put(key, key);
    }
    let hits = AtomicUsize::new(0);
    let mut pool = Pool::new(NUM_THREADS);

    pool.scoped(|scope| {
        for t in 0..NUM_THREADS as usize {
            let cache = &cache;
            let hits = &hits;
            scope.execute(move || {
                for i in 0..OPS_PER_THREAD {
                    let key = (t * 131 + i * 17) % 2_048;
                    if cache.get_with(&key, |v| *v == key) == Some(true) {
                        hits.fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        }
    });

    assert_eq!(
        hits.load(Ordering::Relaxed),
        NUM_THREADS as usize * OPS_PER_THREAD
    );
    assert_eq!(cache.len(), 2_048);
    cache.check_invariants().unwrap();
}

/// Writers, readers, removers, and periodic reconfiguration at once.
#[test]
fn stress_lirs_mixed_with_reconfiguration() {
    let cache = make_cache(1_024, 16, 4);
    let mut pool = Pool::new(NUM_THREADS);

    pool.scoped(|scope| {
        for t in 0..NUM_THREADS as usize {
            let cache = &cache;
            scope.execute(move || {
                for i in 0..OPS_PER_THREAD {
                    let key = (t * 7 + i) % 4_000;
                    match i % 10 {
                        0..=3 => {
                            cache.put_with_memory(key, i, 1 + (key % 4) as u64);
                        }
                        4..=7 => {
                            let _ = cache.get(&key);
                        }
                        8 => {
                            let _ = cache.remove(&key);
                        }
                        _ => {
                            let _ = cache.peek(&key);
                            let _ = cache.contains_key(&key);
                        }
                    }
                    if t == 0 && i % 2_500 == 0 {
                        let max_memory = if i % 5_000 == 0 { 512 } else { 1_024 };
                        cache.set_max_memory(max_memory).unwrap();
                    }
                }
            });
        }
    });

    cache.check_invariants().unwrap();
    let used = cache.used_memory();
    let summed: u64 = cache
        .key_set()
        .iter()
        .map(|key| cache.get_memory(key))
        .sum();
    assert_eq!(used, summed);
}
