//! Write mock `city;temperature` measurements to a text file in the current
//! directory.

use clap::Parser;
use measurements_mockup::{generate_file, make_rng, GenerationParams, Population};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Generate a large dataset of random city temperature measurements.
#[derive(Parser)]
#[command(name = "mock-measurements")]
struct Args {
    /// Reference table of city names
    #[arg(long, default_value = "worldcities.csv")]
    input: PathBuf,

    /// Column of the reference table holding the city names
    #[arg(long, default_value = "city")]
    column: String,

    /// Output file, truncated if it exists
    #[arg(long, default_value = "large_dataset.txt")]
    output: PathBuf,

    /// Total number of rows (rows beyond the last full chunk are dropped)
    #[arg(long, default_value_t = 1_000_000_000)]
    total_rows: usize,

    /// Number of rows generated and written at a time
    #[arg(long, default_value_t = 100_000_000)]
    chunk_size: usize,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Mock data parameters.
    let params = GenerationParams::new(args.total_rows, args.chunk_size)?;
    print!("{}", params);

    // Read the population of city names.
    print!("Reading city names from {}...", args.input.display());
    std::io::stdout().flush()?;
    let population = Population::from_csv_path(&args.input, &args.column)?;
    println!(" done.");
    println!("{}.", population);

    // Generate and write the measurements chunk by chunk.
    print!("Writing mock measurements to {}...", args.output.display());
    std::io::stdout().flush()?;
    let mut rng = make_rng(args.seed);
    let summary = generate_file(&population, &params, &mut rng, &args.output)?;
    println!(" done.");
    println!("{}.", summary);

    println!("Dataset generated and saved to {}", args.output.display());
    Ok(())
}
