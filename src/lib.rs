//! Generate a large mock dataset of `city;temperature` measurements.
//!
//! A [`Population`] of city names is read from a reference table, then
//! [`generate()`] draws random (city, temperature) pairs chunk by chunk and
//! appends them to an output as text lines such as `Tokyo;12.3`. The
//! [`aggregate`] module reads such a file back into per-city mean, min and max.

pub mod aggregate;
pub mod batch;
pub mod error;
pub mod generate;
pub mod params;
pub mod population;

pub use aggregate::{aggregate_file, aggregate_reader, write_report, Station, StationMap};
pub use batch::SampleBatch;
pub use error::{Error, Result};
pub use generate::{generate, generate_file, Summary};
pub use params::{GenerationParams, MAX_TEMPERATURE, MIN_TEMPERATURE};
pub use population::{Population, MISSING_NAME};

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Initialize a random number generator. With a seed the generated output is
/// byte-for-byte reproducible, otherwise the generator is seeded from the
/// operating system.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
