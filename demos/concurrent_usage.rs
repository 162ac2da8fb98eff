//! Concurrent Cache Usage Examples
//!
//! Multi-threaded usage patterns for `ConcurrentLirsCache`.
//!
//! Run with: cargo run --example concurrent_usage --features concurrent

use lirs_cache::config::{ConcurrentCacheConfig, ConcurrentLirsCacheConfig, LirsCacheConfig};
use lirs_cache::ConcurrentLirsCache;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

fn lirs_config(max_memory: u64, average_memory: u64, segments: usize) -> ConcurrentLirsCacheConfig {
    ConcurrentCacheConfig {
        base: LirsCacheConfig::new(max_memory).with_average_memory(average_memory),
        segments,
    }
}

fn main() {
    println!("Concurrent LIRS Cache Examples");
    println!("==============================\n");

    basic_sharing();
    weighted_values();
    read_heavy_workload();
    segment_scaling();
}

/// Sharing one cache between worker threads through an `Arc`.
fn basic_sharing() {
    println!("1. Sharing a cache between threads");

    let cache: Arc<ConcurrentLirsCache<String, usize>> =
        Arc::new(ConcurrentLirsCache::new(10_000).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..1_000 {
                    cache.put(format!("worker-{t}-{i}"), i);
                }
                (0..1_000)
                    .filter(|i| cache.get(&format!("worker-{t}-{i}")).is_some())
                    .count()
            })
        })
        .collect();

    for (t, handle) in handles.into_iter().enumerate() {
        let found = handle.join().unwrap();
        println!("   worker {t} read back {found} of its 1000 keys");
    }
    println!("   total entries: {}\n", cache.len());
}

/// Values with individual memory costs against a byte budget.
fn weighted_values() {
    println!("2. Memory-weighted values");

    let config = lirs_config(64 * 1024, 1024, 8);
    let cache: ConcurrentLirsCache<u32, Vec<u8>> = ConcurrentLirsCache::init(config, None).unwrap();

    for id in 0..200u32 {
        let size = 256 + (id as usize % 8) * 256;
        cache.put_with_memory(id, vec![0u8; size], size as u64);
    }

    println!(
        "   used {} of {} bytes across {} resident values ({} remembered as history)",
        cache.used_memory(),
        cache.max_memory(),
        cache.len(),
        cache.size_non_resident()
    );
    if let Some(len) = cache.get_with(&199, |v| v.len()) {
        println!("   newest value is {len} bytes, read without cloning");
    }
    println!();
}

/// Many readers over a resident working set.
fn read_heavy_workload() {
    println!("3. Read-heavy workload");

    let cache: Arc<ConcurrentLirsCache<u64, u64>> =
        Arc::new(ConcurrentLirsCache::with_limits(100_000, 1, 16, 1_000).unwrap());
    for key in 0..50_000 {
        cache.put(key, key * 2);
    }

    let start = Instant::now();
    let handles: Vec<_> = (0..8u64)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                let mut sum = 0u64;
                for i in 0..100_000u64 {
                    let key = (t * 7_919 + i * 13) % 50_000;
                    sum += cache.get(&key).unwrap_or(0);
                }
                sum
            })
        })
        .collect();
    let total: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
    let elapsed = start.elapsed();

    println!(
        "   800000 reads in {:.2?} ({:.1}M ops/s), checksum {total}\n",
        elapsed,
        800_000.0 / elapsed.as_secs_f64() / 1_000_000.0
    );
}

/// Effect of the segment count on a mixed workload.
fn segment_scaling() {
    println!("4. Segment count scaling");

    for segments in [1, 4, 16, 64] {
        let cache: Arc<ConcurrentLirsCache<u64, u64>> = Arc::new(
            ConcurrentLirsCache::init(lirs_config(10_000, 1, segments), None).unwrap(),
        );

        let start = Instant::now();
        let handles: Vec<_> = (0..8u64)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..50_000u64 {
                        let key = (t * 50_000 + i) % 20_000;
                        if i % 4 == 0 {
                            cache.put(key, i);
                        } else {
                            let _ = cache.get(&key);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        println!(
            "   {segments:>3} segments: {:>8.2?}, {} resident",
            start.elapsed(),
            cache.len()
        );
    }
}
