use std::fs::File;
use std::io::BufReader;
use std::time::Instant;
use clap::Parser;
use log::warn;
use cachelib::cache::CacheTrait;
use cachelib::config::CacheConfig;
use cachelib::error::CacheError;
use cachelib::io::{get_reader, TraceReader};
use cachelib::simulator::{AccessRecord, GenericCacheSimulator};

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

#[derive(Parser, Debug)]
#[command(about = String::from("Set-associative cache simulator, classifies every address of a trace"))]
struct Args {
    config: String,
    trace: String,

    /// Overrides the seed of the random replacement policy
    #[arg(short, long)]
    seed: Option<u64>,

    #[arg(short, long)]
    performance: bool,

    #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
    debug: bool,
}

fn main() -> Result<(), String> {
    env_logger::init();
    let start = Instant::now();
    let args = Args::parse();
    let config_file = File::open(&args.config).map_err(|e| format!("Couldn't open the config file at path {}: {e}", args.config))?;
    let mut config: CacheConfig = serde_json::from_reader(BufReader::new(config_file)).map_err(|e| format!("Couldn't parse the config file: {e}"))?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let mut simulator = GenericCacheSimulator::from_config(&config).map_err(|e| format!("Couldn't build the cache: {e}"))?;
    let trace_file = File::open(&args.trace).map_err(|e| format!("Couldn't open the trace file at path {}: {e}", args.trace))?;
    let trace_reader = get_reader(trace_file)?;
    let simulation_start = Instant::now();
    let mut records = Vec::new();
    for address in TraceReader::new(trace_reader) {
        let address = address.map_err(|e| format!("Couldn't read the trace file: {e}"))?;
        match simulator.access(address) {
            Ok(result) => records.push(AccessRecord { address, result }),
            // Skipping is safe, a rejected address never touches the cache
            Err(e @ CacheError::AddressOutOfRange { .. }) => warn!("Skipping access: {e}"),
            Err(e) => return Err(format!("Simulation failed: {e}")),
        }
    }
    let simulation_time = simulation_start.elapsed();
    println!("{}", serde_json::to_string_pretty(&records).map_err(|e| format!("Couldn't serialise the output {e}"))?);
    if args.performance {
        let total_time = start.elapsed();
        println!("Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9);
        println!("Total execution time (includes initial parsing, configuration, and output): {}s", total_time.as_nanos() as f64 / 1e9)
    }
    if args.debug {
        #[cfg(debug_assertions)]
        println!("Running the debug binary, debug mode is enabled by default. If benchmarking, do not use this binary, re-compile with the --release argument when using cargo run");
        println!("Parsed input configuration: {:?}", simulator.config());
        let formatted = simulator
            .valid_line_counts()
            .iter()
            .enumerate()
            .map(|(set, count)| format!("{set}: {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        println!("Valid lines by set: ({formatted})");
        println!("Total uninitialised cache lines: {}", simulator.uninitialised_line_count())
    }
    Ok(())
}
