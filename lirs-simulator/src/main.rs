use clap::{Parser, Subcommand};
use lirs_simulator::generator::{TraceConfig, TraceGenerator};
use lirs_simulator::models::{Budget, CacheAlgorithm, SimulationConfig};
use lirs_simulator::runner::SimulationRunner;
use lirs_simulator::stats::SimulationStats;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Trace-driven simulator for the LIRS cache
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a trace through the selected caches
    Simulate {
        /// Trace file, or directory of trace files
        #[arg(short, long, value_name = "PATH")]
        input: PathBuf,

        /// Cache capacity in entries (ignored with --max-bytes)
        #[arg(short, long, default_value = "10000")]
        capacity: u64,

        /// Bound the caches by object bytes instead of entry count
        #[arg(long, value_name = "BYTES")]
        max_bytes: Option<u64>,

        /// Algorithms to simulate (lirs, lirs-conc, lru, moka); all if omitted
        #[arg(short, long, value_name = "ALGOS", num_args = 1.., value_delimiter = ',')]
        algorithms: Option<Vec<String>>,

        /// Number of segments for the concurrent LIRS cache
        #[arg(long, default_value = "16")]
        segments: usize,

        /// Stack move distance for LIRS (derived from the budget if omitted)
        #[arg(long)]
        stack_move_distance: Option<u64>,

        /// Export results to a CSV file
        #[arg(long, value_name = "PATH")]
        output_csv: Option<PathBuf>,
    },

    /// Generate a synthetic trace: a Zipf working set interleaved with scans
    Generate {
        /// Total number of requests
        #[arg(long, default_value = "1000000")]
        requests: u64,

        /// Distinct keys in the working set
        #[arg(long, default_value = "10000")]
        hot_objects: u64,

        /// Zipf exponent of the working set
        #[arg(long, default_value = "0.9")]
        zipf: f64,

        /// Working set requests between scans (0 disables scans)
        #[arg(long, default_value = "20000")]
        scan_interval: u64,

        /// One-time keys read by each scan
        #[arg(long, default_value = "20000")]
        scan_length: u64,

        /// Minimum object size in bytes
        #[arg(long, default_value = "1024")]
        min_size: u64,

        /// Maximum object size in bytes
        #[arg(long, default_value = "65536")]
        max_size: u64,

        /// RNG seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Output file
        #[arg(short, long, default_value = "traces/synthetic.csv")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Args::parse().command {
        Commands::Generate {
            requests,
            hot_objects,
            zipf,
            scan_interval,
            scan_length,
            min_size,
            max_size,
            seed,
            output,
        } => {
            let config = TraceConfig {
                requests,
                hot_objects,
                zipf_exponent: zipf,
                scan_interval,
                scan_length,
                min_size,
                max_size: max_size.max(min_size),
                seed,
                output,
            };
            let written = TraceGenerator::new(config.clone()).generate()?;
            println!("Wrote {written} requests to {}", config.output.display());
            Ok(())
        }

        Commands::Simulate {
            input,
            capacity,
            max_bytes,
            algorithms,
            segments,
            stack_move_distance,
            output_csv,
        } => {
            let budget = match max_bytes {
                Some(bytes) => Budget::Bytes(bytes),
                None => Budget::Entries(capacity),
            };
            let config = SimulationConfig {
                input,
                budget,
                algorithms: parse_algorithms(algorithms.as_deref()),
                segments,
                stack_move_distance,
            };
            run_simulation(config, output_csv)
        }
    }
}

/// Maps algorithm names to algorithms, skipping unknown ones.
fn parse_algorithms(names: Option<&[String]>) -> Vec<CacheAlgorithm> {
    let selected: Vec<_> = names
        .unwrap_or_default()
        .iter()
        .filter_map(|name| {
            let algo = CacheAlgorithm::parse(name);
            if algo.is_none() {
                tracing::warn!(name = %name, "unknown algorithm, skipping");
            }
            algo
        })
        .collect();

    if selected.is_empty() {
        CacheAlgorithm::all()
    } else {
        selected
    }
}

fn run_simulation(
    config: SimulationConfig,
    output_csv: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("LIRS Cache Simulation");
    println!("=====================");
    println!("Input: {}", config.input.display());
    println!("Budget: {}", config.budget);
    println!(
        "Algorithms: {:?}",
        config.algorithms.iter().map(|a| a.as_str()).collect::<Vec<_>>()
    );

    let result = SimulationRunner::new(config).run()?;

    println!("\nSimulation completed in {:.2?}", result.duration);
    println!("Total requests: {}", result.total_requests);
    println!("Unique objects: {}", result.unique_objects);

    let stats = SimulationStats::from_result(&result);
    stats.print_summary();

    if let Some(path) = output_csv {
        stats.export_csv(&path)?;
        println!("\nResults exported to: {}", path.display());
    }
    Ok(())
}
