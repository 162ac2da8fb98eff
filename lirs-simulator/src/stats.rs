// Statistics collection and reporting for cache simulation

use crate::models::{
    AlgorithmStats, CacheAlgorithm, CsvResultRow, LatencyPercentiles, OpLatencyStats,
    SimulationResult,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;

const MAX_SAMPLES: usize = 5_000;

/// Tracks latency for one operation type. Percentiles come from a reservoir
/// sample so memory stays bounded on long traces.
#[derive(Debug)]
pub struct OpLatencyTracker {
    total_ns: u64,
    count: u64,
    min_ns: u64,
    max_ns: u64,
    samples: Vec<u64>,
    rng: StdRng,
}

impl Default for OpLatencyTracker {
    fn default() -> Self {
        Self {
            total_ns: 0,
            count: 0,
            min_ns: u64::MAX,
            max_ns: 0,
            samples: Vec::with_capacity(MAX_SAMPLES),
            rng: StdRng::seed_from_u64(0x5eed),
        }
    }
}

impl OpLatencyTracker {
    #[inline]
    pub fn record(&mut self, latency_ns: u64) {
        self.total_ns += latency_ns;
        self.count += 1;
        self.min_ns = self.min_ns.min(latency_ns);
        self.max_ns = self.max_ns.max(latency_ns);

        if self.samples.len() < MAX_SAMPLES {
            self.samples.push(latency_ns);
        } else {
            let slot = self.rng.gen_range(0..self.count) as usize;
            if slot < MAX_SAMPLES {
                self.samples[slot] = latency_ns;
            }
        }
    }

    pub fn finalize(mut self) -> OpLatencyStats {
        let percentiles = if self.samples.is_empty() {
            None
        } else {
            self.samples.sort_unstable();
            let at = |q: f64| {
                let idx = ((self.samples.len() - 1) as f64 * q).round() as usize;
                self.samples[idx]
            };
            Some(LatencyPercentiles {
                p50_ns: at(0.50),
                p90_ns: at(0.90),
                p99_ns: at(0.99),
            })
        };

        OpLatencyStats {
            total_ns: self.total_ns,
            count: self.count,
            min_ns: if self.count == 0 { 0 } else { self.min_ns },
            max_ns: self.max_ns,
            percentiles,
        }
    }
}

/// Collects and reports statistics from simulation runs
#[derive(Debug, Default)]
pub struct SimulationStats {
    stats: Vec<(CacheAlgorithm, AlgorithmStats)>,
}

impl SimulationStats {
    pub fn new(algorithms: &[CacheAlgorithm]) -> Self {
        Self {
            stats: algorithms
                .iter()
                .map(|&algo| (algo, AlgorithmStats::new()))
                .collect(),
        }
    }

    pub fn from_result(result: &SimulationResult) -> Self {
        Self {
            stats: result.stats.clone(),
        }
    }

    fn entry(&mut self, algorithm: CacheAlgorithm) -> Option<&mut AlgorithmStats> {
        self.stats
            .iter_mut()
            .find(|(algo, _)| *algo == algorithm)
            .map(|(_, stats)| stats)
    }

    pub fn get(&self, algorithm: CacheAlgorithm) -> Option<&AlgorithmStats> {
        self.stats
            .iter()
            .find(|(algo, _)| *algo == algorithm)
            .map(|(_, stats)| stats)
    }

    pub fn record_hit(&mut self, algorithm: CacheAlgorithm, size: u64) {
        if let Some(stats) = self.entry(algorithm) {
            stats.hits += 1;
            stats.bytes_hit += size;
        }
    }

    pub fn record_miss(&mut self, algorithm: CacheAlgorithm, size: u64) {
        if let Some(stats) = self.entry(algorithm) {
            stats.misses += 1;
            stats.bytes_miss += size;
        }
    }

    /// Records the end state of a replay.
    pub fn record_run(
        &mut self,
        algorithm: CacheAlgorithm,
        time_ms: u64,
        final_entries: u64,
        final_used: u64,
        latency: crate::models::LatencyStats,
    ) {
        if let Some(stats) = self.entry(algorithm) {
            stats.simulation_time_ms = time_ms;
            stats.final_entries = final_entries;
            stats.final_used = final_used;
            stats.latency = latency;
        }
    }

    pub fn into_stats(self) -> Vec<(CacheAlgorithm, AlgorithmStats)> {
        self.stats
    }

    pub fn print_summary(&self) {
        println!("\nResults:");
        println!(
            "{:<10} {:>8} {:>9} {:>10} {:>12} {:>10} {:>10} {:>10}",
            "Algo", "HitRate", "ByteHit%", "Entries", "Used", "GetAvg", "PutAvg", "GetP99"
        );
        println!("{}", "-".repeat(86));

        for (algo, stats) in &self.stats {
            println!(
                "{:<10} {:>7.2}% {:>8.2}% {:>10} {:>12} {:>8.0}ns {:>8.0}ns {:>8}ns",
                algo.as_str(),
                stats.hit_rate(),
                stats.byte_hit_rate(),
                stats.final_entries,
                stats.final_used,
                stats.latency.get_stats.avg_ns(),
                stats.latency.put_stats.avg_ns(),
                stats.latency.get_stats.p99_ns(),
            );
        }

        if let (Some(lirs), Some(lru)) = (
            self.get(CacheAlgorithm::Lirs),
            self.get(CacheAlgorithm::Lru),
        ) {
            println!(
                "\nLIRS vs LRU hit rate: {:+.2} points",
                lirs.hit_rate() - lru.hit_rate()
            );
        }
        if let (Some(seq), Some(conc)) = (
            self.get(CacheAlgorithm::Lirs),
            self.get(CacheAlgorithm::ConcurrentLirs),
        ) {
            println!(
                "Segmented vs single LIRS hit rate: {:+.2} points (eviction is per segment)",
                conc.hit_rate() - seq.hit_rate()
            );
        }
    }

    pub fn export_csv(&self, path: &Path) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_path(path)?;
        for (algo, stats) in &self.stats {
            writer.serialize(CsvResultRow::new(*algo, stats))?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_min_max_avg() {
        let mut tracker = OpLatencyTracker::default();
        for ns in [30, 10, 20] {
            tracker.record(ns);
        }
        let stats = tracker.finalize();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min_ns, 10);
        assert_eq!(stats.max_ns, 30);
        assert_eq!(stats.avg_ns(), 20.0);
        assert_eq!(stats.percentiles.unwrap().p50_ns, 20);
    }

    #[test]
    fn test_tracker_reservoir_is_bounded() {
        let mut tracker = OpLatencyTracker::default();
        for ns in 0..(MAX_SAMPLES as u64 * 4) {
            tracker.record(ns);
        }
        assert_eq!(tracker.samples.len(), MAX_SAMPLES);
        let stats = tracker.finalize();
        assert_eq!(stats.count, MAX_SAMPLES as u64 * 4);
        assert!(stats.percentiles.unwrap().p99_ns > stats.min_ns);
    }

    #[test]
    fn test_empty_tracker() {
        let stats = OpLatencyTracker::default().finalize();
        assert_eq!(stats.min_ns, 0);
        assert!(stats.percentiles.is_none());
    }

    #[test]
    fn test_records_per_algorithm() {
        let mut stats = SimulationStats::new(&[CacheAlgorithm::Lirs, CacheAlgorithm::Lru]);
        stats.record_hit(CacheAlgorithm::Lirs, 100);
        stats.record_miss(CacheAlgorithm::Lirs, 50);
        stats.record_miss(CacheAlgorithm::Lru, 50);
        stats.record_hit(CacheAlgorithm::Moka, 1);

        let lirs = stats.get(CacheAlgorithm::Lirs).unwrap();
        assert_eq!((lirs.hits, lirs.misses, lirs.bytes_hit), (1, 1, 100));
        assert_eq!(stats.get(CacheAlgorithm::Lru).unwrap().misses, 1);
        assert!(stats.get(CacheAlgorithm::Moka).is_none());
    }
}
