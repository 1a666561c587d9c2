//! Command-line front end: loads a comma-delimited dataset (features first, label last), ranks
//! all feature pairs and prints the report as JSON.
//!
//! Usage:
//!   feature_pair_kmeans_bin <FILE> [--max-iterations N] [--restarts N] [--seed S] [--threads T]
//!                           [--verbose 0|1|2] [--output PATH] [--clusters PATH]

use clap::Parser;
use feature_pair_kmeans::{analyze_dataset, Dataset, OptionalParameters};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "feature_pair_kmeans_bin")]
#[command(
    about = "Clusters every pair of feature columns with k-means and ranks the pairs by macro-F1"
)]
struct Args {
    /// Text-file with one sample per line: comma-separated features, label last.
    file: PathBuf,

    /// Maximal number of Lloyd iterations per run.
    #[arg(long, default_value_t = feature_pair_kmeans::DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,

    /// Independent runs per feature pair; the best by macro-F1 is kept.
    #[arg(long, default_value_t = 1)]
    restarts: usize,

    /// Seed for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,

    /// Number of threads (default: number of cores).
    #[arg(long)]
    threads: Option<usize>,

    /// 0: silent, 1: brief, 2: verbose.
    #[arg(long, default_value_t = 1)]
    verbose: u8,

    /// Write the JSON report to this file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write the clustering of the best feature pair to this file (one line per cluster).
    #[arg(long)]
    clusters: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let dataset = Dataset::by_file(&args.file.to_string_lossy())?;
    let optional = OptionalParameters {
        max_iterations: Some(args.max_iterations),
        restarts: Some(args.restarts),
        seed: args.seed,
        thread_count: args.threads,
    };
    let report = analyze_dataset(&dataset, Some(optional))?;

    if let (Some(path), Some(best)) = (&args.clusters, report.best()) {
        best.clustering.save_to_file(&path.to_string_lossy())?;
    }

    let json = serde_json::to_string_pretty(&report)?;
    match &args.output {
        Some(path) => {
            let mut f = File::create(path)?;
            f.write_all(json.as_bytes())?;
        }
        None => println!("{}", json),
    }
    Ok(())
}
