//! Scan Resistance Demonstration
//!
//! A small working set is read over and over while a long one-time scan of
//! fresh keys streams through the same cache. LIRS keeps the working set hot
//! and lets the scan churn through the cold queue only.
//!
//! Run with: cargo run --example scan_resistance

use lirs_cache::config::LirsCacheConfig;
use lirs_cache::metrics::CacheMetrics;
use lirs_cache::LirsCache;

const BUDGET: u64 = 100;
const WORKING_SET: u64 = 80;
const SCAN_LENGTH: u64 = 10_000;

fn main() {
    let config = LirsCacheConfig::with_max_entries(BUDGET);
    let mut cache: LirsCache<u64, String> = LirsCache::init(config, None).unwrap();

    println!("Budget: {BUDGET} entries, working set: {WORKING_SET} keys");

    // Warm the working set: every key referenced twice.
    for round in 0..2 {
        for key in 0..WORKING_SET {
            if cache.get(&key).is_none() {
                cache.put(key, format!("value-{key}"));
            }
        }
        println!(
            "after warm-up round {}: {} resident, {} hot",
            round + 1,
            cache.len(),
            cache.size_hot()
        );
    }

    // Interleave the scan with working set reads.
    let mut working_set_hits = 0u64;
    let mut working_set_reads = 0u64;
    for i in 0..SCAN_LENGTH {
        let scan_key = 1_000_000 + i;
        cache.put(scan_key, format!("scan-{i}"));

        let key = i % WORKING_SET;
        working_set_reads += 1;
        if cache.get(&key).is_some() {
            working_set_hits += 1;
        } else {
            cache.put(key, format!("value-{key}"));
        }
    }

    println!();
    println!("scan of {SCAN_LENGTH} one-time keys finished");
    println!(
        "working set hit rate during scan: {:.1}%",
        100.0 * working_set_hits as f64 / working_set_reads as f64
    );
    println!(
        "resident: {}, hot: {}, cold: {}, history: {}",
        cache.len(),
        cache.size_hot(),
        cache.keys(true, false).len(),
        cache.size_non_resident()
    );

    let survivors = (0..WORKING_SET).filter(|k| cache.contains_key(k)).count();
    println!("working set keys still resident: {survivors}/{WORKING_SET}");

    println!();
    println!("{} metrics:", cache.algorithm_name());
    for (name, value) in cache.metrics() {
        println!("  {name:<24} {value:>12.2}");
    }
}
