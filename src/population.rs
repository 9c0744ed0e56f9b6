//! Reference population of city names.

use crate::error::{Error, Result};
use std::io::Read;
use std::path::Path;

/// Name given to a blank cell of the city column.
pub const MISSING_NAME: &str = "nan";

/// Ordered, non-empty list of city names eligible for random selection.
///
/// Built once from the reference table and never modified afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Population {
    // Invariant: never empty.
    names: Vec<String>,
}
impl Population {
    /// Make a population from a list of names, kept as is. Returns
    /// [`Error::EmptyPopulation`] if there are no names.
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(Error::EmptyPopulation);
        }
        Ok(Self { names })
    }

    /// Read the table at `path` and keep every other value (positions 0, 2,
    /// 4, ...) of the column whose header is `column`. A blank cell still takes
    /// up its position and is named [`MISSING_NAME`].
    pub fn from_csv_path<P: AsRef<Path>>(path: P, column: &str) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), column, "reading reference table");
        // Open the file ourselves so a missing file surfaces as an io error.
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file, column)
    }

    /// Delegates to the same even-position filtering as
    /// [`Population::from_csv_path()`], reading the table from any reader.
    pub fn from_csv_reader<R: Read>(reader: R, column: &str) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);

        // Find the named column by its header.
        let col = rdr
            .headers()?
            .iter()
            .position(|header| header == column)
            .ok_or_else(|| Error::MissingColumn {
                column: column.to_owned(),
            })?;

        // Materialize the whole column, then keep even positions only.
        let mut values = Vec::new();
        for record in rdr.records() {
            let record = record?;
            // The reader rejects records shorter than the header row.
            let value = match record.get(col).unwrap_or_default() {
                "" => MISSING_NAME,
                value => value,
            };
            values.push(value.to_owned());
        }
        let names: Vec<String> = values.into_iter().step_by(2).collect();

        Self::new(names)
    }

    /// Number of names in the population, always at least one.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the population has no names.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
impl std::fmt::Display for Population {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Population of {} city names", self.names.len())
    }
}
