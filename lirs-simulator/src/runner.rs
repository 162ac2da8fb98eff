//! Simulation runner
//!
//! Replays one trace through every selected cache under the same budget. Each
//! request is a `get`; a miss is followed by a `put` of the object, the way a
//! read-through cache in front of a slower store behaves.
//!
//! The trace is streamed once to collect dataset statistics and once per
//! algorithm, so memory use is proportional to the cache size, not the trace.

use std::collections::HashSet;
use std::time::Instant;

use ahash::RandomState as AHashRandomState;
use lirs_cache::config::{ConcurrentCacheConfig, LirsCacheConfig};
use lirs_cache::{ConcurrentLirsCache, LirsCache, LirsError};
use lru::LruCache;
use moka::sync::Cache as MokaCache;
use thiserror::Error;

use crate::input::{TraceError, TraceReader};
use crate::models::{
    Budget, CacheAlgorithm, LatencyStats, Request, SimulationConfig, SimulationResult,
};
use crate::stats::{OpLatencyTracker, SimulationStats};

const PROGRESS_INTERVAL: u64 = 10_000_000;

/// Errors that abort a simulation
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Trace(#[from] TraceError),
    #[error("invalid cache configuration: {0}")]
    Cache(#[from] LirsError),
    #[error("trace contains no requests")]
    EmptyTrace,
}

/// Dataset statistics from the first pass over the trace
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceSummary {
    pub requests: u64,
    pub unique_objects: u64,
    pub avg_object_size: u64,
}

impl TraceSummary {
    pub fn collect<I>(requests: I) -> Result<Self, SimulationError>
    where
        I: IntoIterator<Item = Result<Request, TraceError>>,
    {
        let mut count = 0u64;
        let mut bytes = 0u64;
        let mut keys = HashSet::new();
        for request in requests {
            let request = request?;
            count += 1;
            bytes += request.size;
            keys.insert(request.key);
            if count % PROGRESS_INTERVAL == 0 {
                tracing::info!(requests = count, "scanning trace");
            }
        }
        if count == 0 {
            return Err(SimulationError::EmptyTrace);
        }
        Ok(Self {
            requests: count,
            unique_objects: keys.len() as u64,
            avg_object_size: (bytes / count).max(1),
        })
    }
}

/// `lru::LruCache` bounded by the sum of entry costs instead of a count.
struct WeightedLru {
    cache: LruCache<String, u64>,
    used: u64,
    limit: u64,
}

impl WeightedLru {
    fn new(limit: u64) -> Self {
        Self {
            cache: LruCache::unbounded(),
            used: 0,
            limit,
        }
    }

    fn put(&mut self, key: String, cost: u64) {
        if let Some(old) = self.cache.put(key, cost) {
            self.used -= old;
        }
        self.used += cost;
        while self.used > self.limit && self.cache.len() > 1 {
            match self.cache.pop_lru() {
                Some((_, evicted)) => self.used -= evicted,
                None => break,
            }
        }
    }
}

/// The caches under test. Values are the cost charged for the entry.
enum CacheWrapper {
    Lirs(LirsCache<String, u64>),
    ConcurrentLirs(ConcurrentLirsCache<String, u64>),
    Lru(WeightedLru),
    Moka(MokaCache<String, u64, AHashRandomState>),
}

impl CacheWrapper {
    fn create(
        algorithm: CacheAlgorithm,
        config: &SimulationConfig,
        summary: &TraceSummary,
    ) -> Result<Self, SimulationError> {
        let limit = config.budget.limit();
        let lirs_config = || {
            let base = match config.budget {
                Budget::Entries(n) => LirsCacheConfig::with_max_entries(n),
                Budget::Bytes(n) => {
                    LirsCacheConfig::new(n).with_average_memory(summary.avg_object_size)
                }
            };
            match config.stack_move_distance {
                Some(distance) => base.with_stack_move_distance(distance),
                None => base,
            }
        };

        let cache = match algorithm {
            CacheAlgorithm::Lirs => CacheWrapper::Lirs(LirsCache::init(lirs_config(), None)?),
            CacheAlgorithm::ConcurrentLirs => {
                let config = ConcurrentCacheConfig::new(lirs_config()).with_segments(config.segments);
                CacheWrapper::ConcurrentLirs(ConcurrentLirsCache::init(config, None)?)
            }
            CacheAlgorithm::Lru => CacheWrapper::Lru(WeightedLru::new(limit)),
            CacheAlgorithm::Moka => {
                let builder = MokaCache::builder().max_capacity(limit);
                let cache = match config.budget {
                    Budget::Entries(_) => builder.build_with_hasher(AHashRandomState::default()),
                    Budget::Bytes(_) => builder
                        .weigher(|_key: &String, cost: &u64| {
                            u32::try_from(*cost).unwrap_or(u32::MAX)
                        })
                        .build_with_hasher(AHashRandomState::default()),
                };
                CacheWrapper::Moka(cache)
            }
        };
        Ok(cache)
    }

    fn get(&mut self, key: &str) -> bool {
        match self {
            CacheWrapper::Lirs(c) => c.get(key).is_some(),
            CacheWrapper::ConcurrentLirs(c) => c.get(key).is_some(),
            CacheWrapper::Lru(c) => c.cache.get(key).is_some(),
            CacheWrapper::Moka(c) => c.get(key).is_some(),
        }
    }

    fn put(&mut self, key: String, cost: u64) {
        match self {
            CacheWrapper::Lirs(c) => {
                c.put_with_memory(key, cost, cost);
            }
            CacheWrapper::ConcurrentLirs(c) => {
                c.put_with_memory(key, cost, cost);
            }
            CacheWrapper::Lru(c) => c.put(key, cost),
            CacheWrapper::Moka(c) => c.insert(key, cost),
        }
    }

    /// Resident entries and budget units in use.
    fn usage(&mut self) -> (u64, u64) {
        match self {
            CacheWrapper::Lirs(c) => (c.len() as u64, c.used_memory()),
            CacheWrapper::ConcurrentLirs(c) => (c.len() as u64, c.used_memory()),
            CacheWrapper::Lru(c) => (c.cache.len() as u64, c.used),
            CacheWrapper::Moka(c) => {
                c.run_pending_tasks();
                (c.entry_count(), c.weighted_size())
            }
        }
    }
}

pub struct SimulationRunner {
    config: SimulationConfig,
}

impl SimulationRunner {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    pub fn run(&self) -> Result<SimulationResult, SimulationError> {
        let reader = TraceReader::new(&self.config.input);
        let start = Instant::now();

        let summary = TraceSummary::collect(reader.stream_requests()?)?;
        tracing::info!(
            requests = summary.requests,
            unique_objects = summary.unique_objects,
            avg_object_size = summary.avg_object_size,
            "trace scanned"
        );

        let mut stats = SimulationStats::new(&self.config.algorithms);
        for &algorithm in &self.config.algorithms {
            self.replay(algorithm, &summary, reader.stream_requests()?, &mut stats)?;
        }

        Ok(SimulationResult {
            stats: stats.into_stats(),
            total_requests: summary.requests,
            unique_objects: summary.unique_objects,
            duration: start.elapsed(),
        })
    }

    /// Replays `requests` through a fresh cache of kind `algorithm`.
    pub fn replay<I>(
        &self,
        algorithm: CacheAlgorithm,
        summary: &TraceSummary,
        requests: I,
        stats: &mut SimulationStats,
    ) -> Result<(), SimulationError>
    where
        I: IntoIterator<Item = Result<Request, TraceError>>,
    {
        let mut cache = CacheWrapper::create(algorithm, &self.config, summary)?;
        let mut get_latency = OpLatencyTracker::default();
        let mut put_latency = OpLatencyTracker::default();
        let started = Instant::now();
        let mut processed = 0u64;

        tracing::info!(algorithm = %algorithm, budget = %self.config.budget, "replaying trace");

        for request in requests {
            let request = request?;
            let cost = self.config.budget.cost_of(request.size);

            let op = Instant::now();
            let hit = cache.get(&request.key);
            get_latency.record(op.elapsed().as_nanos() as u64);

            if hit {
                stats.record_hit(algorithm, request.size);
            } else {
                let op = Instant::now();
                cache.put(request.key, cost);
                put_latency.record(op.elapsed().as_nanos() as u64);
                stats.record_miss(algorithm, request.size);
            }

            processed += 1;
            if processed % PROGRESS_INTERVAL == 0 {
                tracing::info!(algorithm = %algorithm, processed, "replay progress");
            }
        }

        let elapsed = started.elapsed();
        let (entries, used) = cache.usage();
        tracing::info!(
            algorithm = %algorithm,
            elapsed_ms = elapsed.as_millis() as u64,
            entries,
            used,
            "replay finished"
        );

        stats.record_run(
            algorithm,
            elapsed.as_millis() as u64,
            entries,
            used,
            LatencyStats {
                get_stats: get_latency.finalize(),
                put_stats: put_latency.finalize(),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{TraceConfig, TraceGenerator};

    fn scan_heavy_trace() -> Vec<Request> {
        let config = TraceConfig {
            requests: 4_000,
            hot_objects: 50,
            scan_interval: 200,
            scan_length: 200,
            min_size: 100,
            max_size: 100,
            ..TraceConfig::default()
        };
        TraceGenerator::new(config).requests().collect()
    }

    fn runner(budget: Budget) -> SimulationRunner {
        SimulationRunner::new(SimulationConfig {
            input: "unused".into(),
            budget,
            algorithms: CacheAlgorithm::all(),
            segments: 1,
            stack_move_distance: Some(0),
        })
    }

    fn replay_all(runner: &SimulationRunner, trace: &[Request]) -> SimulationStats {
        let summary = TraceSummary::collect(trace.iter().cloned().map(Ok)).unwrap();
        let mut stats = SimulationStats::new(&runner.config.algorithms);
        for &algo in &runner.config.algorithms {
            runner
                .replay(algo, &summary, trace.iter().cloned().map(Ok), &mut stats)
                .unwrap();
        }
        stats
    }

    #[test]
    fn test_summary() {
        let trace = vec![
            Request::new(0, "a", 10),
            Request::new(1, "b", 30),
            Request::new(2, "a", 20),
        ];
        let summary = TraceSummary::collect(trace.into_iter().map(Ok)).unwrap();
        assert_eq!(summary.requests, 3);
        assert_eq!(summary.unique_objects, 2);
        assert_eq!(summary.avg_object_size, 20);
    }

    #[test]
    fn test_empty_trace() {
        let err = TraceSummary::collect(std::iter::empty()).unwrap_err();
        assert!(matches!(err, SimulationError::EmptyTrace));
    }

    #[test]
    fn test_lirs_beats_lru_on_scans() {
        let trace = scan_heavy_trace();
        let stats = replay_all(&runner(Budget::Entries(60)), &trace);

        let lirs = stats.get(CacheAlgorithm::Lirs).unwrap();
        let lru = stats.get(CacheAlgorithm::Lru).unwrap();
        assert_eq!(lirs.hits + lirs.misses, 4_000);
        assert!(lirs.hit_rate() > lru.hit_rate());
        assert!(lirs.final_used <= 60);
        assert!(lru.final_entries <= 60);
    }

    #[test]
    fn test_single_segment_matches_sequential() {
        let trace = scan_heavy_trace();
        let stats = replay_all(&runner(Budget::Entries(60)), &trace);

        let seq = stats.get(CacheAlgorithm::Lirs).unwrap();
        let conc = stats.get(CacheAlgorithm::ConcurrentLirs).unwrap();
        assert_eq!(seq.hits, conc.hits);
        assert_eq!(seq.final_used, conc.final_used);
    }

    #[test]
    fn test_byte_budget() {
        let trace = scan_heavy_trace();
        let stats = replay_all(&runner(Budget::Bytes(6_000)), &trace);

        for algo in [CacheAlgorithm::Lirs, CacheAlgorithm::Lru] {
            let s = stats.get(algo).unwrap();
            assert!(s.final_used <= 6_000, "{algo} used {}", s.final_used);
            assert_eq!(s.bytes_hit + s.bytes_miss, 400_000);
        }
    }

    #[test]
    fn test_weighted_lru_evicts_by_cost() {
        let mut lru = WeightedLru::new(100);
        lru.put("a".into(), 60);
        lru.put("b".into(), 30);
        let _ = lru.cache.get("a");
        lru.put("c".into(), 30);
        assert_eq!(lru.used, 90);
        assert!(lru.cache.contains("a"));
        assert!(!lru.cache.contains("b"));

        lru.put("huge".into(), 500);
        assert_eq!(lru.cache.len(), 1);
        assert_eq!(lru.used, 500);
    }
}
