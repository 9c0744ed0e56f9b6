//! Parameters for generating mock measurements.

use crate::error::{Error, Result};
use std::num::NonZeroUsize;

/// Lowest temperature that can be drawn.
pub const MIN_TEMPERATURE: f64 = 0.0;

/// Temperatures are drawn strictly below this value. After rounding to one
/// decimal a drawn value may still render as `40.0`.
pub const MAX_TEMPERATURE: f64 = 40.0;

/// Total number of rows and number of rows generated per chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenerationParams {
    /// Number of rows requested
    pub total_rows: NonZeroUsize,
    /// Number of rows held in memory and written together
    pub chunk_size: NonZeroUsize,
}
impl GenerationParams {
    /// Make new parameters. Neither count may be zero.
    pub fn new(total_rows: usize, chunk_size: usize) -> Result<Self> {
        let total_rows = NonZeroUsize::new(total_rows).ok_or(Error::ZeroParam { name: "total rows" })?;
        let chunk_size = NonZeroUsize::new(chunk_size).ok_or(Error::ZeroParam { name: "chunk size" })?;
        Ok(Self {
            total_rows,
            chunk_size,
        })
    }

    /// Number of full chunks that will be generated.
    pub fn n_chunks(&self) -> usize {
        self.total_rows.get() / self.chunk_size.get()
    }

    /// Rows left over after the last full chunk. These are not generated.
    pub fn remainder(&self) -> usize {
        self.total_rows.get() % self.chunk_size.get()
    }

    /// Number of rows that will actually be written.
    pub fn rows_emitted(&self) -> usize {
        self.n_chunks() * self.chunk_size.get()
    }
}
impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            total_rows: NonZeroUsize::new(1_000_000_000).unwrap(),
            chunk_size: NonZeroUsize::new(100_000_000).unwrap(),
        }
    }
}
impl std::fmt::Display for GenerationParams {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "Mock measurement parameters:")?;
        writeln!(f, "Total number of rows: {}", self.total_rows)?;
        writeln!(f, "Rows per chunk: {}", self.chunk_size)?;
        writeln!(f, "Number of chunks: {}", self.n_chunks())?;
        if self.remainder() != 0 {
            writeln!(f, "Rows dropped: {}", self.remainder())?;
        }
        writeln!(f, "Temperatures from {:.1} up to but excluding {:.1}", MIN_TEMPERATURE, MAX_TEMPERATURE)?;
        Ok(())
    }
}
