#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("error reading reference table: {0}")]
    Csv(#[from] csv::Error),

    #[error("reference table has no column named {column:?}")]
    MissingColumn { column: String },

    #[error("population of city names is empty, nothing to sample from")]
    EmptyPopulation,

    #[error("malformed measurement line {line:?}")]
    MalformedLine { line: String },

    #[error("{name} must be greater than zero")]
    ZeroParam { name: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;
