// Data models for LIRS cache simulation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// One record of a request trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Logical time of the request (sequence number or unix seconds)
    pub timestamp: u64,
    /// Cache key
    pub key: String,
    /// Size of the object in bytes
    pub size: u64,
}

impl Request {
    pub fn new(timestamp: u64, key: impl Into<String>, size: u64) -> Self {
        Self {
            timestamp,
            key: key.into(),
            size,
        }
    }
}

/// Cache implementations the simulator can replay a trace through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheAlgorithm {
    /// Single-threaded `LirsCache`
    Lirs,
    /// Segmented `ConcurrentLirsCache`
    ConcurrentLirs,
    /// `lru::LruCache`, bounded by entries or by bytes
    Lru,
    /// Moka (TinyLFU admission, external crate for comparison)
    Moka,
}

impl CacheAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheAlgorithm::Lirs => "LIRS",
            CacheAlgorithm::ConcurrentLirs => "LIRS-Conc",
            CacheAlgorithm::Lru => "LRU",
            CacheAlgorithm::Moka => "Moka",
        }
    }

    /// Parses a command line name; unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "lirs" | "lirs-seq" => Some(CacheAlgorithm::Lirs),
            "lirs-conc" | "concurrent-lirs" | "conc" => Some(CacheAlgorithm::ConcurrentLirs),
            "lru" => Some(CacheAlgorithm::Lru),
            "moka" => Some(CacheAlgorithm::Moka),
            _ => None,
        }
    }

    /// Get all available algorithms
    pub fn all() -> Vec<CacheAlgorithm> {
        vec![
            CacheAlgorithm::Lirs,
            CacheAlgorithm::ConcurrentLirs,
            CacheAlgorithm::Lru,
            CacheAlgorithm::Moka,
        ]
    }
}

impl fmt::Display for CacheAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the cache budget is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    /// At most this many resident entries
    Entries(u64),
    /// At most this many bytes of resident objects
    Bytes(u64),
}

impl Budget {
    /// Memory charged for a request of `size` bytes under this budget.
    pub fn cost_of(&self, size: u64) -> u64 {
        match self {
            Budget::Entries(_) => 1,
            Budget::Bytes(_) => size.max(1),
        }
    }

    pub fn limit(&self) -> u64 {
        match self {
            Budget::Entries(n) | Budget::Bytes(n) => *n,
        }
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Budget::Entries(n) => write!(f, "{n} entries"),
            Budget::Bytes(n) => write!(f, "{n} bytes ({:.2} MB)", *n as f64 / 1_048_576.0),
        }
    }
}

/// Configuration for a simulation run
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Trace file, or directory of trace files replayed in name order
    pub input: PathBuf,
    /// Cache budget shared by every algorithm
    pub budget: Budget,
    /// Algorithms to simulate
    pub algorithms: Vec<CacheAlgorithm>,
    /// Number of segments for the concurrent LIRS cache
    pub segments: usize,
    /// Stack move distance for the LIRS caches (`None` = derived from the budget)
    pub stack_move_distance: Option<u64>,
}

/// Statistics for a single algorithm
#[derive(Debug, Default, Clone)]
pub struct AlgorithmStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Bytes served from cache (hits)
    pub bytes_hit: u64,
    /// Bytes fetched from the backend (misses)
    pub bytes_miss: u64,
    /// Replay time in milliseconds
    pub simulation_time_ms: u64,
    /// Resident entries at the end of the replay
    pub final_entries: u64,
    /// Budget units in use at the end of the replay
    pub final_used: u64,
    /// Get and put latencies
    pub latency: LatencyStats,
}

impl AlgorithmStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        percentage(self.hits, self.hits + self.misses)
    }

    /// Byte hit rate as a percentage
    pub fn byte_hit_rate(&self) -> f64 {
        percentage(self.bytes_hit, self.bytes_hit + self.bytes_miss)
    }
}

fn percentage(part: u64, total: u64) -> f64 {
    if total > 0 {
        part as f64 * 100.0 / total as f64
    } else {
        0.0
    }
}

/// Latency statistics for one operation type
#[derive(Debug, Clone, Default)]
pub struct OpLatencyStats {
    /// Total time spent (nanoseconds)
    pub total_ns: u64,
    /// Number of operations
    pub count: u64,
    pub min_ns: u64,
    pub max_ns: u64,
    pub percentiles: Option<LatencyPercentiles>,
}

impl OpLatencyStats {
    pub fn avg_ns(&self) -> f64 {
        if self.count > 0 {
            self.total_ns as f64 / self.count as f64
        } else {
            0.0
        }
    }

    pub fn ops_per_sec(&self) -> f64 {
        if self.total_ns > 0 {
            (self.count as f64 * 1_000_000_000.0) / self.total_ns as f64
        } else {
            0.0
        }
    }

    pub fn p99_ns(&self) -> u64 {
        self.percentiles.as_ref().map_or(0, |p| p.p99_ns)
    }
}

/// Latency statistics for all cache operations of a run
#[derive(Debug, Clone, Default)]
pub struct LatencyStats {
    pub get_stats: OpLatencyStats,
    pub put_stats: OpLatencyStats,
}

impl LatencyStats {
    pub fn total_ops(&self) -> u64 {
        self.get_stats.count + self.put_stats.count
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatencyPercentiles {
    pub p50_ns: u64,
    pub p90_ns: u64,
    pub p99_ns: u64,
}

/// Results of a simulation run, in the order the algorithms were replayed
#[derive(Debug)]
pub struct SimulationResult {
    pub stats: Vec<(CacheAlgorithm, AlgorithmStats)>,
    /// Requests in the trace
    pub total_requests: u64,
    /// Distinct keys in the trace
    pub unique_objects: u64,
    /// Wall time of the whole simulation
    pub duration: Duration,
}

/// CSV export row for simulation results
#[derive(Debug, Serialize)]
pub struct CsvResultRow {
    pub algorithm: String,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub byte_hit_rate: f64,
    pub bytes_hit: u64,
    pub bytes_miss: u64,
    pub simulation_time_ms: u64,
    pub final_entries: u64,
    pub final_used: u64,
    pub get_ops: u64,
    pub get_avg_ns: f64,
    pub get_p50_ns: u64,
    pub get_p99_ns: u64,
    pub put_ops: u64,
    pub put_avg_ns: f64,
    pub put_p50_ns: u64,
    pub put_p99_ns: u64,
}

impl CsvResultRow {
    pub fn new(algorithm: CacheAlgorithm, stats: &AlgorithmStats) -> Self {
        let get = &stats.latency.get_stats;
        let put = &stats.latency.put_stats;
        Self {
            algorithm: algorithm.as_str().to_string(),
            hits: stats.hits,
            misses: stats.misses,
            hit_rate: stats.hit_rate(),
            byte_hit_rate: stats.byte_hit_rate(),
            bytes_hit: stats.bytes_hit,
            bytes_miss: stats.bytes_miss,
            simulation_time_ms: stats.simulation_time_ms,
            final_entries: stats.final_entries,
            final_used: stats.final_used,
            get_ops: get.count,
            get_avg_ns: get.avg_ns(),
            get_p50_ns: get.percentiles.as_ref().map_or(0, |p| p.p50_ns),
            get_p99_ns: get.p99_ns(),
            put_ops: put.count,
            put_avg_ns: put.avg_ns(),
            put_p50_ns: put.percentiles.as_ref().map_or(0, |p| p.p50_ns),
            put_p99_ns: put.p99_ns(),
        }
    }
}
