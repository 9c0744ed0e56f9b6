//! Chunked sample-and-write loop.

use crate::batch::SampleBatch;
use crate::error::Result;
use crate::params::GenerationParams;
use crate::population::Population;
use rand::Rng;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

// Rough size of one output line, used to size the chunk buffer.
const LINE_CAPACITY_HINT: usize = 16;

// Upper limit on the up-front buffer allocation, 1 GiB. Larger chunks grow the
// buffer as they are formatted.
const MAX_BUFFER_HINT: usize = 1 << 30;

fn buffer_capacity(chunk_size: usize) -> usize {
    chunk_size.saturating_mul(LINE_CAPACITY_HINT).min(MAX_BUFFER_HINT)
}

/// What a call to [`generate()`] wrote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// Number of chunks written
    pub chunks: usize,
    /// Number of lines written
    pub rows: usize,
    /// Number of bytes written
    pub bytes: usize,
}
impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Wrote {} rows ({} bytes) in {} chunks", self.rows, self.bytes, self.chunks)
    }
}

/// Generate `params.n_chunks()` chunks of random measurements drawn from
/// `population` and write them to `out`, one chunk at a time.
///
/// Each chunk is sampled, formatted into a single buffer, written with one
/// call to `write_all` and dropped before the next chunk is sampled, so at most
/// one chunk is held in memory. Rows beyond the last full chunk are not
/// generated. The first write error aborts generation and may leave a partial
/// line behind.
pub fn generate<R, W>(population: &Population, params: &GenerationParams, rng: &mut R, out: &mut W) -> Result<Summary>
where
    R: Rng + ?Sized,
    W: Write,
{
    let n_chunks = params.n_chunks();
    let chunk_size = params.chunk_size.get();

    if params.remainder() != 0 {
        tracing::warn!(
            total_rows = params.total_rows.get(),
            chunk_size,
            dropped = params.remainder(),
            "total rows is not a multiple of the chunk size, dropping remainder"
        );
    }
    tracing::info!(
        population = population.len(),
        chunks = n_chunks,
        chunk_size,
        rows = params.rows_emitted(),
        "generating measurements"
    );

    let mut summary = Summary::default();
    for chunk in 0..n_chunks {
        let mut buf = Vec::with_capacity(buffer_capacity(chunk_size));
        {
            let batch = SampleBatch::<f64>::random_using(population, chunk_size, rng);
            batch.write_lines(&mut buf)?;
            summary.rows += batch.len();
            // Batch is dropped and released here at end of scope.
        }
        out.write_all(&buf)?;
        summary.chunks += 1;
        summary.bytes += buf.len();
        tracing::debug!(chunk = chunk + 1, of = n_chunks, bytes = buf.len(), "wrote chunk");
    }
    out.flush()?;

    tracing::info!(rows = summary.rows, bytes = summary.bytes, "finished generating measurements");
    Ok(summary)
}

/// Delegates to [`generate()`], writing to the file at `path`. Any existing
/// file is truncated.
pub fn generate_file<R, P>(population: &Population, params: &GenerationParams, rng: &mut R, path: P) -> Result<Summary>
where
    R: Rng + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "creating output file");
    let mut out = BufWriter::new(File::create(path)?);
    generate(population, params, rng, &mut out)
}
