//! One chunk of randomly sampled measurements.

use crate::params::{MAX_TEMPERATURE, MIN_TEMPERATURE};
use crate::population::Population;
use ndarray::{Array, Dim};
use ndarray_rand::RandomExt;
use num_traits::{AsPrimitive, Float};
use rand::distributions::uniform::SampleUniform;
use rand::Rng;
use rand_distr::Uniform;
use std::io::Write;

/// A chunk of mock measurements with temperatures of numeric type S, e.g. f64.
///
/// City names are borrowed from the [`Population`] they were drawn from.
/// Dropping the batch releases the whole chunk.
#[derive(Clone, Debug)]
pub struct SampleBatch<'a, S> {
    /// 1-dimensional vector of city names, drawn with replacement
    pub cities: Array<&'a str, Dim<[usize; 1]>>,
    /// 1-dimensional vector of temperatures parallel to `cities`
    pub temperatures: Array<S, Dim<[usize; 1]>>,
}
impl<'a, S> SampleBatch<'a, S>
where
    S: Float + SampleUniform + std::fmt::Display + 'static,
    f64: AsPrimitive<S>,
{
    /// Randomly draw `rows` measurements.
    ///
    /// Each city is drawn uniformly and independently from `population`, each
    /// temperature uniformly from `[MIN_TEMPERATURE, MAX_TEMPERATURE)`. City
    /// indices are drawn before temperatures, so a seeded `rng` reproduces the
    /// same batch.
    pub fn random_using<R: Rng + ?Sized>(population: &'a Population, rows: usize, rng: &mut R) -> Self {
        let names = population.names();

        // Draw a vector of indices into the population and translate them to
        // names. The indices are dropped at the end of this block.
        let cities = {
            let indices = Array::<usize, _>::random_using(rows, Uniform::new(0, names.len()), rng);
            indices.map(move |&index| names[index].as_str())
        };

        // Draw a parallel vector of temperatures.
        let temperatures = Array::<S, _>::random_using(
            rows,
            Uniform::new(MIN_TEMPERATURE.as_(), MAX_TEMPERATURE.as_()),
            rng,
        );

        Self { cities, temperatures }
    }

    /// Number of measurements in the batch.
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Iterate over (city, temperature) pairs in draw order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, S)> + '_ {
        self.cities
            .iter()
            .copied()
            .zip(self.temperatures.iter().copied())
    }

    /// Write one `city;temperature` line per measurement, with the temperature
    /// rounded to one decimal.
    pub fn write_lines<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        for (city, temperature) in self.iter() {
            writeln!(out, "{city};{temperature:.1}")?;
        }
        Ok(())
    }
}
