use crate::climate::data_loader::{DataLocation, TableLoader};
use crate::climate::error::FetchError;
use crate::climate::filtering::{day_key, AmedasFrameFilterExt};
use crate::climate::source::ClimateSource;
use crate::error::AmedasError;
use crate::observatories::index::MatchMode;
use crate::types::climate_record::ClimateRecord;
use crate::types::columns::{ADDRESS_NAME, DATE, DISPLAY_NAME, NEAREST_OBSERVATORY, OBSERVATORY_NAME};
use crate::types::data_category::DataCategory;
use crate::types::date_range::DateRange;
use crate::types::observatory::{ObservatoryId, ObservatoryReference};
use crate::utils::get_cache_dir;
use bon::bon;
use chrono::NaiveDate;
use log::{debug, warn};
use polars::prelude::{Column, DataFrame, DataType, LazyFrame};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tokio::task;

const OBSERVATORY_TABLE: &str = "observatories";
const DAILY_TABLE: &str = "daily";
const FIRST_DAY: &str = "FIRST_DAY";
const LAST_DAY: &str = "LAST_DAY";

/// File-based description of where the tables live, e.g.
///
/// ```json
/// {
///   "observatories": { "file": "data/observatories.csv" },
///   "daily": { "url": "https://example.com/amedas/daily.csv.gz" },
///   "match_mode": "containment"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub observatories: DataLocation,
    pub daily: DataLocation,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default)]
    pub match_mode: MatchMode,
}

impl SourceConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, AmedasError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AmedasError::ConfigRead(path.to_path_buf(), e))?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Reads the observatory reference table and the daily observation table.
///
/// Loaded frames are kept for the lifetime of the source, so repeated runs do not
/// read or download a table twice.
pub struct FrameSource {
    observatories: DataLocation,
    daily: DataLocation,
    loader: TableLoader,
    lazyframe_cache: Mutex<HashMap<DataLocation, LazyFrame>>,
}

#[bon]
impl FrameSource {
    /// Creates a source. Without a `cache_dir` downloads are cached in
    /// `amedas_rs_cache` under the user's cache directory.
    ///
    /// ```no_run
    /// # use amedas::{DataLocation, FrameSource, AmedasError};
    /// # fn run() -> Result<(), AmedasError> {
    /// let source = FrameSource::builder()
    ///     .observatories(DataLocation::File("data/observatories.csv".into()))
    ///     .daily(DataLocation::Url("https://example.com/amedas/daily.csv.gz".into()))
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub fn new(
        observatories: DataLocation,
        daily: DataLocation,
        #[builder(into)] cache_dir: Option<PathBuf>,
    ) -> Result<Self, AmedasError> {
        let cache_dir = match cache_dir {
            Some(dir) => dir,
            None => get_cache_dir()?,
        };
        Ok(Self {
            observatories,
            daily,
            loader: TableLoader::new(&cache_dir),
            lazyframe_cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn from_config(config: &SourceConfig) -> Result<Self, AmedasError> {
        Self::builder()
            .observatories(config.observatories.clone())
            .daily(config.daily.clone())
            .maybe_cache_dir(config.cache_dir.clone())
            .build()
    }

    pub fn cache_dir(&self) -> &Path {
        self.loader.cache_dir()
    }

    /// The first and last day present in the daily table, or `None` when it has no
    /// dated rows. Useful to offer a sensible default range.
    pub async fn date_bounds(&self) -> Result<Option<DateRange>, FetchError> {
        let frame = self.get_cache_lazyframe(&self.daily, DAILY_TABLE).await?;
        require_columns(&frame, DAILY_TABLE, &[DATE]).await?;
        let bounds = frame.select([
            day_key().min().alias(FIRST_DAY),
            day_key().max().alias(LAST_DAY),
        ]);
        let df = task::spawn_blocking(move || bounds.collect()).await??;

        let (Some(first), Some(last)) = (bound_day(&df, FIRST_DAY)?, bound_day(&df, LAST_DAY)?)
        else {
            return Ok(None);
        };
        debug!("Daily table covers {} to {}", first, last);
        Ok(DateRange::from_dates(first, last).ok())
    }

    async fn get_cache_lazyframe(
        &self,
        location: &DataLocation,
        table: &str,
    ) -> Result<LazyFrame, FetchError> {
        {
            let cache = self.lazyframe_cache.lock().await;
            if let Some(cached) = cache.get(location) {
                return Ok(cached.clone());
            }
        }

        // Loading happens outside the lock
        let loaded_frame = self.loader.get_frame(location, table).await?;

        let mut cache = self.lazyframe_cache.lock().await;
        match cache.entry(location.clone()) {
            // Someone else loaded it in the meantime
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                entry.insert(loaded_frame.clone());
                Ok(loaded_frame)
            }
        }
    }
}

impl ClimateSource for FrameSource {
    async fn observatories(&self) -> Result<Vec<ObservatoryReference>, FetchError> {
        let frame = self
            .get_cache_lazyframe(&self.observatories, OBSERVATORY_TABLE)
            .await?;
        let df = task::spawn_blocking(move || frame.collect()).await??;
        references_from_frame(&df)
    }

    async fn climate_records(
        &self,
        observatory_ids: &[ObservatoryId],
        range: DateRange,
        category: DataCategory,
    ) -> Result<Vec<ClimateRecord>, FetchError> {
        let frame = self.get_cache_lazyframe(&self.daily, DAILY_TABLE).await?;
        require_columns(&frame, DAILY_TABLE, &[OBSERVATORY_NAME, DATE, category.column_name()])
            .await?;
        let filtered = frame.filter_daily(&range).select_category(category);
        let df = task::spawn_blocking(move || filtered.collect()).await??;

        let wanted: HashSet<&str> = observatory_ids.iter().map(|id| id.as_str()).collect();
        let records = records_from_frame(&df, &wanted, category)?;
        debug!(
            "Daily table: {} of {} rows in {} belong to the {} requested observatories",
            records.len(),
            df.height(),
            range,
            wanted.len()
        );
        Ok(records)
    }
}

async fn require_columns(
    frame: &LazyFrame,
    table: &str,
    columns: &[&str],
) -> Result<(), FetchError> {
    let mut schema_frame = frame.clone();
    let schema = task::spawn_blocking(move || schema_frame.collect_schema()).await??;
    match columns.iter().find(|c| schema.get(c).is_none()) {
        Some(missing) => Err(FetchError::MissingColumn {
            table: table.to_string(),
            column: missing.to_string(),
        }),
        None => Ok(()),
    }
}

fn string_column(df: &DataFrame, table: &str, name: &str) -> Result<Column, FetchError> {
    let column = df.column(name).map_err(|_| FetchError::MissingColumn {
        table: table.to_string(),
        column: name.to_string(),
    })?;
    Ok(column.cast(&DataType::String)?)
}

fn bound_day(df: &DataFrame, name: &str) -> Result<Option<NaiveDate>, FetchError> {
    let Some(day) = df.column(name)?.str()?.get(0) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| FetchError::InvalidCell {
            table: DAILY_TABLE.to_string(),
            column: DATE.to_string(),
            row: 0,
            message: format!("'{}': {}", day, e),
        })
}

fn references_from_frame(df: &DataFrame) -> Result<Vec<ObservatoryReference>, FetchError> {
    let addresses = string_column(df, OBSERVATORY_TABLE, ADDRESS_NAME)?;
    let ids = string_column(df, OBSERVATORY_TABLE, NEAREST_OBSERVATORY)?;
    let names = match df.column(DISPLAY_NAME) {
        Ok(column) => Some(column.cast(&DataType::String)?),
        Err(_) => None,
    };
    let names = names.as_ref().map(|c| c.str()).transpose()?;

    let mut references = Vec::with_capacity(df.height());
    let mut skipped = 0usize;
    for (row, (address, id)) in addresses.str()?.into_iter().zip(ids.str()?).enumerate() {
        let (Some(address), Some(id)) = (address, id) else {
            skipped += 1;
            continue;
        };
        let mut reference = ObservatoryReference::new(id.trim(), address);
        if let Some(name) = names.and_then(|n| n.get(row)) {
            reference = reference.with_display_name(name);
        }
        references.push(reference);
    }
    if skipped > 0 {
        warn!(
            "Skipped {} observatory rows without {} or {}",
            skipped, ADDRESS_NAME, NEAREST_OBSERVATORY
        );
    }
    Ok(references)
}

fn records_from_frame(
    df: &DataFrame,
    wanted: &HashSet<&str>,
    category: DataCategory,
) -> Result<Vec<ClimateRecord>, FetchError> {
    let ids = string_column(df, DAILY_TABLE, OBSERVATORY_NAME)?;
    let dates = string_column(df, DAILY_TABLE, DATE)?;
    let values = df.column(category.column_name())?.cast(&DataType::Float64)?;

    let mut records = Vec::new();
    let rows = ids.str()?.into_iter().zip(dates.str()?).zip(values.f64()?);
    for (row, ((id, date), value)) in rows.enumerate() {
        let Some(id) = id.map(str::trim).filter(|id| wanted.contains(id)) else {
            continue;
        };
        let Some(date) = date else {
            continue;
        };
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|e| {
            FetchError::InvalidCell {
                table: DAILY_TABLE.to_string(),
                column: DATE.to_string(),
                row,
                message: format!("'{}': {}", date, e),
            }
        })?;
        records.push(ClimateRecord::new(id, date, category, value));
    }
    Ok(records)
}
