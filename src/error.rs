use crate::climate::error::FetchError;
use chrono::NaiveDate;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Structural problems with the parameters or reference data of a run.
///
/// These are fatal and never retried: the caller has to fix the input.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Date range start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Could not resolve '{0}' to a date")]
    DateParsing(String),

    #[error("Address column '{column}' does not exist (available: {available:?})")]
    UnknownAddressColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("Row has {found} cells but the table has {expected} columns")]
    RowWidth { expected: usize, found: usize },

    #[error("Input column '{0}' collides with an output column of the join")]
    ColumnCollision(String),

    #[error("Duplicate reference entry: prefix '{prefix}' is declared twice for observatory '{observatory_id}'")]
    DuplicateReference {
        prefix: String,
        observatory_id: String,
    },

    #[error("Reference prefix '{raw}' of observatory '{observatory_id}' is empty after normalization")]
    EmptyReferencePrefix { raw: String, observatory_id: String },

    #[error("Got {results} match results for {rows} input rows")]
    MatchResultMismatch { rows: usize, results: usize },
}

#[derive(Debug, Error)]
pub enum AmedasError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to build output DataFrame")]
    Export(#[from] PolarsError),

    #[error("Failed to write output file '{0}'")]
    ExportIo(PathBuf, #[source] std::io::Error),

    #[error("Failed to read configuration file '{0}'")]
    ConfigRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to (de)serialize JSON")]
    Json(#[from] serde_json::Error),
}
