use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    // Errors during parquet writing (inside blocking task)
    #[error("I/O error writing parquet cache file '{0}'")]
    ParquetWriteIo(PathBuf, #[source] std::io::Error),
    #[error("Encoding error writing parquet cache file '{0}'")]
    ParquetWritePolars(PathBuf, #[source] PolarsError),

    #[error("Failed to scan parquet file '{0}'")]
    ParquetScan(PathBuf, #[source] PolarsError),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Data download or decompression failed")]
    DownloadIo(#[from] std::io::Error),

    // Errors during CSV reading (inside blocking task)
    #[error("I/O error processing CSV data from '{origin}'")]
    CsvReadIo {
        origin: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Parsing error processing CSV data from '{origin}'")]
    CsvReadPolars {
        origin: String,
        #[source]
        source: PolarsError,
    },

    #[error("Unsupported table file '{0}', expected .csv, .csv.gz or .parquet")]
    UnsupportedFormat(PathBuf),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Failed processing DataFrame: {0}")]
    DataFrameProcessing(#[from] PolarsError),

    #[error("Missing required column '{column}' in {table} table")]
    MissingColumn { table: String, column: String },

    #[error("Invalid value in column '{column}' of {table} table, row {row}: {message}")]
    InvalidCell {
        table: String,
        column: String,
        row: usize,
        message: String,
    },

    /// Failure reported by a custom [`crate::ClimateSource`].
    #[error("Climate source failed: {0}")]
    Collaborator(String),
}
