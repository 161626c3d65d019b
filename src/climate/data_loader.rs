use crate::climate::error::FetchError;
use async_compression::tokio::bufread::GzipDecoder;
use futures_util::TryStreamExt;
use log::{info, warn};
use polars::frame::DataFrame;
use polars::prelude::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::{fs, task};
use tokio_util::io::StreamReader;

/// Where a table lives.
///
/// Files may be `.csv`, `.csv.gz` or `.parquet`. URLs must serve CSV with a header
/// row, gzip compressed when the URL ends in `.gz`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataLocation {
    File(PathBuf),
    Url(String),
}

impl fmt::Display for DataLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataLocation::File(path) => write!(f, "{}", path.display()),
            DataLocation::Url(url) => f.write_str(url),
        }
    }
}

/// Loads tables into `LazyFrame`s. Downloads are cached as Parquet in `cache_dir`.
pub struct TableLoader {
    cache_dir: PathBuf,
    download_client: Client,
}

impl TableLoader {
    pub fn new(cache_dir: &Path) -> TableLoader {
        TableLoader {
            cache_dir: cache_dir.to_path_buf(),
            download_client: Client::new(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Loads the table at `location`. `table` names the table in cache file names
    /// and error messages.
    pub async fn get_frame(
        &self,
        location: &DataLocation,
        table: &str,
    ) -> Result<LazyFrame, FetchError> {
        match location {
            DataLocation::File(path) => self.load_file(path).await,
            DataLocation::Url(url) => self.load_url(url, table).await,
        }
    }

    async fn load_file(&self, path: &Path) -> Result<LazyFrame, FetchError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if name.ends_with(".parquet") {
            info!("Scanning parquet table {:?}", path);
            return LazyFrame::scan_parquet(path, Default::default())
                .map_err(|e| FetchError::ParquetScan(path.to_path_buf(), e));
        }
        if name.ends_with(".csv.gz") {
            let file = fs::File::open(path).await.map_err(|e| FetchError::CsvReadIo {
                origin: path.display().to_string(),
                source: e,
            })?;
            let mut decoder = GzipDecoder::new(BufReader::new(file));
            let mut decompressed = Vec::new();
            decoder.read_to_end(&mut decompressed).await?;
            let df = Self::csv_to_dataframe(decompressed, &path.display().to_string()).await?;
            return Ok(df.lazy());
        }
        if name.ends_with(".csv") {
            let path_buf = path.to_path_buf();
            let df = task::spawn_blocking(move || read_csv_file(&path_buf)).await??;
            return Ok(df.lazy());
        }
        Err(FetchError::UnsupportedFormat(path.to_path_buf()))
    }

    async fn load_url(&self, url: &str, table: &str) -> Result<LazyFrame, FetchError> {
        let parquet_path = self.cache_dir.join(cache_file_name(table, url));

        if fs::metadata(&parquet_path).await.is_ok() {
            info!("Cache hit for {} table from {} at {:?}", table, url, parquet_path);
        } else {
            warn!(
                "Cache miss for {} table from {}. Downloading and processing.",
                table, url
            );
            let raw_bytes = self.download(url).await?;
            let df = Self::csv_to_dataframe(raw_bytes, url).await?;

            fs::create_dir_all(&self.cache_dir)
                .await
                .map_err(|e| FetchError::CacheDirCreation(self.cache_dir.clone(), e))?;

            Self::cache_dataframe(df, &parquet_path).await?;
            info!("Cached {} table to {:?}", table, parquet_path);
        }

        LazyFrame::scan_parquet(&parquet_path, Default::default())
            .map_err(|e| FetchError::ParquetScan(parquet_path.clone(), e))
    }

    /// Downloads a table, decompressing it when the URL ends in `.gz`.
    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        info!("Downloading data from {}", url);

        let response = self
            .download_client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    FetchError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    FetchError::NetworkRequest(url.to_string(), e)
                });
            }
        };

        let stream = response.bytes_stream().map_err(std::io::Error::other);
        let mut stream_reader = StreamReader::new(stream);
        let mut bytes = Vec::new();
        if url.ends_with(".gz") {
            GzipDecoder::new(stream_reader).read_to_end(&mut bytes).await?;
        } else {
            stream_reader.read_to_end(&mut bytes).await?;
        }
        info!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }

    /// Parses CSV bytes with a header row on a blocking task.
    async fn csv_to_dataframe(bytes: Vec<u8>, origin: &str) -> Result<DataFrame, FetchError> {
        let origin = origin.to_string();
        task::spawn_blocking(move || {
            let mut temp_file = NamedTempFile::new().map_err(|e| FetchError::CsvReadIo {
                origin: origin.clone(),
                source: e,
            })?;
            temp_file
                .write_all(&bytes)
                .and_then(|_| temp_file.flush())
                .map_err(|e| FetchError::CsvReadIo {
                    origin: origin.clone(),
                    source: e,
                })?;
            read_csv_file(temp_file.path()).map_err(|e| match e {
                FetchError::CsvReadPolars { source, .. } => FetchError::CsvReadPolars { origin, source },
                other => other,
            })
        })
        .await?
    }

    async fn cache_dataframe(mut df: DataFrame, path: &Path) -> Result<(), FetchError> {
        let path_buf = path.to_path_buf();
        task::spawn_blocking(move || {
            let file = std::fs::File::create(&path_buf)
                .map_err(|e| FetchError::ParquetWriteIo(path_buf.clone(), e))?;
            ParquetWriter::new(file)
                .with_compression(ParquetCompression::Snappy)
                .finish(&mut df)
                .map_err(|e| FetchError::ParquetWritePolars(path_buf, e))?;
            Ok::<(), FetchError>(())
        })
        .await??;
        Ok(())
    }
}

/// Reads a CSV file with a header row.
pub(crate) fn read_csv_file(path: &Path) -> Result<DataFrame, FetchError> {
    let origin = || path.display().to_string();
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| FetchError::CsvReadPolars {
            origin: origin(),
            source: e,
        })?
        .finish()
        .map_err(|e| FetchError::CsvReadPolars {
            origin: origin(),
            source: e,
        })
}

/// Cache file name for a downloaded table: the table name plus the SHA-256 of the
/// full URL.
fn cache_file_name(table: &str, url: &str) -> String {
    format!("{}_{}.parquet", table, hex::encode(Sha256::digest(url.as_bytes())))
}
