//! Cache Metrics Demonstration
//!
//! Runs the same workload against a single-threaded and a concurrent LIRS
//! cache and prints their metrics side by side.
//!
//! Run with: cargo run --example metrics_demo --features concurrent

use lirs_cache::config::LirsCacheConfig;
use lirs_cache::metrics::CacheMetrics;
use lirs_cache::{ConcurrentLirsCache, LirsCache};
use std::collections::BTreeSet;

const BUDGET: u64 = 64;

fn main() {
    println!("LIRS Cache Metrics");
    println!("==================\n");

    let mut sequential: LirsCache<u32, u32> =
        LirsCache::init(LirsCacheConfig::new(BUDGET), None).unwrap();
    let concurrent: ConcurrentLirsCache<u32, u32> =
        ConcurrentLirsCache::with_limits(BUDGET, 1, 4, 0).unwrap();

    // Working set of 40 keys, each referenced a few times, with a run of
    // one-time keys in between.
    for round in 0..4 {
        for key in 0..40 {
            if sequential.get(&key).is_none() {
                sequential.put(key, key);
            }
            if concurrent.get(&key).is_none() {
                concurrent.put(key, key);
            }
        }
        for key in 0..50 {
            let key = 1_000 + round * 50 + key;
            sequential.put(key, key);
            concurrent.put(key, key);
        }
    }

    let caches: Vec<&dyn CacheMetrics> = vec![&sequential, &concurrent];
    display_metrics_comparison(&caches);
}

fn display_metrics_comparison(caches: &[&dyn CacheMetrics]) {
    let reports: Vec<_> = caches.iter().map(|c| c.metrics()).collect();
    let names: BTreeSet<&String> = reports.iter().flat_map(|m| m.keys()).collect();

    print!("{:<24}", "metric");
    for cache in caches {
        print!("{:>16}", cache.algorithm_name());
    }
    println!();
    println!("{}", "-".repeat(24 + 16 * caches.len()));

    for name in names {
        print!("{name:<24}");
        for report in &reports {
            match report.get(name) {
                Some(value) if value.fract() == 0.0 => print!("{value:>16.0}"),
                Some(value) => print!("{value:>16.3}"),
                None => print!("{:>16}", "-"),
            }
        }
        println!();
    }
}
