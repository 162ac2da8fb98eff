//! Synthetic trace generation
//!
//! The generated workload mixes a Zipf-distributed working set with bursts of
//! one-time keys read in sequence. Plain recency caches let every burst flush
//! the working set; a scan-resistant cache should not.

use crate::models::Request;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::PathBuf;

/// Parameters for a synthetic trace
#[derive(Debug, Clone)]
pub struct TraceConfig {
    /// Total number of requests
    pub requests: u64,
    /// Distinct keys in the working set
    pub hot_objects: u64,
    /// Zipf exponent of the working set popularity
    pub zipf_exponent: f64,
    /// Working set requests between two scans (0 disables scans)
    pub scan_interval: u64,
    /// Fresh keys read by each scan
    pub scan_length: u64,
    /// Minimum object size in bytes
    pub min_size: u64,
    /// Maximum object size in bytes
    pub max_size: u64,
    /// RNG seed, so traces are reproducible
    pub seed: u64,
    /// Output file
    pub output: PathBuf,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            requests: 1_000_000,
            hot_objects: 10_000,
            zipf_exponent: 0.9,
            scan_interval: 20_000,
            scan_length: 20_000,
            min_size: 1024,
            max_size: 64 * 1024,
            seed: 42,
            output: PathBuf::from("traces/synthetic.csv"),
        }
    }
}

/// Zipf sampler over ranks `0..n` using an inverted cumulative table.
#[derive(Debug, Clone)]
pub struct Zipf {
    cdf: Vec<f64>,
}

impl Zipf {
    pub fn new(n: u64, exponent: f64) -> Self {
        let mut cdf = Vec::with_capacity(n as usize);
        let mut total = 0.0;
        for rank in 1..=n {
            total += 1.0 / (rank as f64).powf(exponent);
            cdf.push(total);
        }
        for p in &mut cdf {
            *p /= total;
        }
        Self { cdf }
    }

    /// Draws a rank; rank 0 is the most popular.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> u64 {
        let u: f64 = rng.gen();
        let rank = self.cdf.partition_point(|&p| p < u);
        rank.min(self.cdf.len().saturating_sub(1)) as u64
    }
}

/// Writes synthetic request traces
pub struct TraceGenerator {
    config: TraceConfig,
}

impl TraceGenerator {
    pub fn new(config: TraceConfig) -> Self {
        Self { config }
    }

    /// Produces the requests of the trace in order.
    pub fn requests(&self) -> impl Iterator<Item = Request> + '_ {
        let config = &self.config;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let zipf = Zipf::new(config.hot_objects.max(1), config.zipf_exponent);
        let mut since_scan = 0u64;
        let mut scan_remaining = 0u64;
        let mut scan_next = 0u64;

        (0..config.requests).map(move |timestamp| {
            if scan_remaining == 0 && config.scan_interval > 0 && since_scan >= config.scan_interval
            {
                scan_remaining = config.scan_length;
                since_scan = 0;
            }

            let key = if scan_remaining > 0 {
                scan_remaining -= 1;
                scan_next += 1;
                format!("scan-{scan_next}")
            } else {
                since_scan += 1;
                format!("hot-{}", zipf.sample(&mut rng))
            };

            let size = if config.max_size > config.min_size {
                rng.gen_range(config.min_size..=config.max_size)
            } else {
                config.min_size
            };
            Request::new(timestamp, key, size)
        })
    }

    /// Writes the trace to the configured output file.
    pub fn generate(&self) -> Result<u64, Box<dyn std::error::Error>> {
        if let Some(parent) = self.config.output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        tracing::info!(
            requests = self.config.requests,
            hot_objects = self.config.hot_objects,
            scan_interval = self.config.scan_interval,
            scan_length = self.config.scan_length,
            output = %self.config.output.display(),
            "generating trace"
        );

        let mut writer = csv::Writer::from_path(&self.config.output)?;
        let mut written = 0u64;
        for request in self.requests() {
            writer.serialize(&request)?;
            written += 1;
        }
        writer.flush()?;
        Ok(written)
    }
}
