//! Read mock `city;temperature` measurements and write the mean, min and max
//! temperature of every city to a CSV file.

use clap::Parser;
use measurements_mockup::aggregate::DEFAULT_CHUNK_BYTES;
use measurements_mockup::{aggregate_file, write_report};
use rayon::ThreadPoolBuilder;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Aggregate a measurements file into per-city statistics.
#[derive(Parser)]
#[command(name = "aggregate-measurements")]
struct Args {
    /// Measurements file, one `city;temperature` per line
    #[arg(long, default_value = "large_dataset.txt")]
    input: PathBuf,

    /// Output CSV file, truncated if it exists
    #[arg(long, default_value = "output.txt")]
    output: PathBuf,

    /// Number of bytes read per chunk
    #[arg(long, default_value_t = DEFAULT_CHUNK_BYTES)]
    chunk_bytes: usize,

    /// Number of parsing threads (defaults to the number of cpus)
    #[arg(long)]
    threads: Option<usize>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Spin up a thread pool.
    let ncpus = match args.threads {
        Some(threads) => threads,
        None => std::thread::available_parallelism()?.get(),
    };
    let pool = ThreadPoolBuilder::default().num_threads(ncpus).build()?;
    println!("Thread pool has {} cpus.", ncpus);

    print!("Aggregating measurements from {}...", args.input.display());
    std::io::stdout().flush()?;
    let time = std::time::Instant::now();
    let stations = pool.install(|| aggregate_file(&args.input, args.chunk_bytes))?;
    println!(" done.\nTime elapsed: {:?}", time.elapsed());
    println!("Found {} cities.", stations.len());

    let stations = stations.into_sorted();
    let mut out = BufWriter::new(File::create(&args.output)?);
    write_report(&stations, &mut out)?;

    println!("Results saved to {}", args.output.display());
    Ok(())
}
