//! Error types for project validation and input-file ingestion.

use thiserror::Error;

/// Configuration errors that abort a simulation run before the first hour.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error("load curve must have {expected} hourly values, got {actual}")]
    LoadCurveLength { expected: usize, actual: usize },
    #[error("producer `{producer}`: profile series `{series}` must have {expected} values, got {actual}")]
    ProfileLength {
        producer: String,
        series: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("producer `{producer}`: {model} model does not match product type {product_type}")]
    ModelMismatch {
        producer: String,
        model: &'static str,
        product_type: &'static str,
    },
    #[error("producer id `{0}` is used more than once")]
    DuplicateProducer(String),
    #[error("producer `{producer}`: invalid interruption time `{value}`")]
    InvalidInterval { producer: String, value: String },
    #[error("buffer: {0}")]
    BufferSpec(String),
}

/// Errors raised while reading weather or load-curve files.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("cannot read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("line {line}: {message}")]
    Parse { line: u64, message: String },
    #[error("no {series} data for {count} hours of the year")]
    Incomplete { series: &'static str, count: usize },
}
