//! The main entry point: attaches daily AMeDAS observations to a table of addresses.
//!
//! An [`Amedas`] instance owns the observatory index, built once from the references
//! of its [`ClimateSource`], and runs the pipeline normalize → match → fetch → join.

use crate::address::normalizer::AddressNormalizer;
use crate::climate::data_loader::DataLocation;
use crate::climate::frame_source::{FrameSource, SourceConfig};
use crate::climate::joiner::join;
use crate::climate::source::ClimateSource;
use crate::error::{AmedasError, ConfigurationError};
use crate::observatories::index::{MatchMode, ObservatoryIndex};
use crate::observatories::matcher::{match_address, match_rows};
use crate::types::columns::JOIN_COLUMNS;
use crate::types::data_category::DataCategory;
use crate::types::date_range::DateRange;
use crate::types::input_table::{InputTable, RowId};
use crate::types::joined_table::JoinedTable;
use crate::types::match_result::MatchResult;
use crate::types::observatory::ObservatoryId;
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use bon::bon;
use log::{debug, info};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Matches addresses to observatories and joins their daily observations.
///
/// The type parameter is the [`ClimateSource`] that supplies reference data and
/// observations. It defaults to [`FrameSource`], which reads CSV or Parquet tables
/// from disk or over HTTP.
///
/// # Examples
///
/// ```rust
/// # use amedas::*;
/// # use chrono::NaiveDate;
/// # #[tokio::main]
/// # async fn main() -> Result<(), AmedasError> {
/// let source = InMemorySource::new(
///     vec![ObservatoryReference::new("東京", "東京都千代田区")],
///     vec![ClimateRecord::new(
///         "東京",
///         NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///         DataCategory::Rainfall,
///         Some(3.2),
///     )],
/// );
/// let amedas = Amedas::with_source(source).await?;
///
/// let table = InputTable::from_text_rows(&["ADDRESS"], [["東京都千代田区大手町１丁目"]])?;
/// let joined = amedas
///     .process_input_data()
///     .table(&table)
///     .address_column("ADDRESS")
///     .category(DataCategory::Rainfall)
///     .date_range(DateRange::new("2024-01-01", "2024-01-07")?)
///     .call()
///     .await?;
/// assert_eq!(joined.len(), 7);
/// assert_eq!(joined.rows()[0].value, Some(3.2));
/// # Ok(())
/// # }
/// ```
pub struct Amedas<S: ClimateSource = FrameSource> {
    source: S,
    index: ObservatoryIndex,
    normalizer: AddressNormalizer,
}

#[bon]
impl<S: ClimateSource> Amedas<S> {
    /// Loads the observatory references from `source` with a single request and
    /// builds the index, matching by containment.
    ///
    /// # Errors
    ///
    /// [`AmedasError::Fetch`] if the references cannot be loaded and
    /// [`AmedasError::Configuration`] if they contain duplicate or empty prefixes.
    pub async fn with_source(source: S) -> Result<Self, AmedasError> {
        Self::with_source_and_mode(source, MatchMode::default()).await
    }

    /// Like [`Amedas::with_source`], with an explicit [`MatchMode`].
    pub async fn with_source_and_mode(source: S, mode: MatchMode) -> Result<Self, AmedasError> {
        let references = source.observatories().await?;
        info!("Loaded {} observatory references", references.len());
        let index = ObservatoryIndex::build_with_mode(references, mode)?;
        Ok(Self::from_parts(source, index))
    }

    /// Uses an index that was built elsewhere. The source is only asked for
    /// observations.
    pub fn from_parts(source: S, index: ObservatoryIndex) -> Self {
        Self {
            source,
            index,
            normalizer: AddressNormalizer::new(),
        }
    }

    pub fn index(&self) -> &ObservatoryIndex {
        &self.index
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Matches a single address. Never fails: an address that contains no known
    /// prefix comes back unmatched.
    ///
    /// ```rust
    /// # use amedas::*;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), AmedasError> {
    /// let source = InMemorySource::new(
    ///     vec![
    ///         ObservatoryReference::new("東京", "東京都"),
    ///         ObservatoryReference::new("渋谷", "東京都渋谷区"),
    ///     ],
    ///     vec![],
    /// );
    /// let amedas = Amedas::with_source(source).await?;
    /// let result = amedas.find_observatory("東京都澁谷區道玄坂２丁目");
    /// assert_eq!(result.observatory_id, Some(ObservatoryId::from("渋谷")));
    /// assert_eq!(result.level, MatchLevel::Municipality);
    /// # Ok(())
    /// # }
    /// ```
    pub fn find_observatory(&self, address: &str) -> MatchResult {
        match_address(RowId(0), &self.normalizer.normalize(address), &self.index)
    }

    /// Attaches the daily values of `category` within `date_range` to every row of
    /// `table`.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.table(&InputTable)`: **Required.** The rows to augment.
    /// * `.address_column(&str)`: **Required.** Name of the column holding the addresses.
    /// * `.category(DataCategory)`: **Required.** Which daily value to attach.
    /// * `.date_range(DateRange)`: **Required.** The days to attach, both ends included.
    ///
    /// Each matched row yields one output row per day of the range. Each unmatched
    /// row yields a single row with empty date and value. The source is asked for
    /// observations once, for the sorted set of matched observatories, and not at
    /// all when nothing matched.
    ///
    /// # Errors
    ///
    /// * [`ConfigurationError::UnknownAddressColumn`] if `address_column` is not in the table.
    /// * [`ConfigurationError::ColumnCollision`] if an input column has the name of an output column.
    /// * [`AmedasError::Fetch`] if the observations cannot be fetched.
    #[builder]
    pub async fn process_input_data(
        &self,
        table: &InputTable,
        address_column: &str,
        category: DataCategory,
        date_range: DateRange,
    ) -> Result<JoinedTable, AmedasError> {
        let column = table.address_column_index(address_column)?;
        check_column_collisions(table, category)?;

        let results = match_rows(table.rows(), column, &self.normalizer, &self.index);
        let observatory_ids: Vec<ObservatoryId> = results
            .iter()
            .filter_map(|r| r.observatory_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let records = if observatory_ids.is_empty() {
            info!("No address matched an observatory, skipping the {} fetch", category);
            Vec::new()
        } else {
            debug!(
                "Fetching {} for {} observatories over {}",
                category,
                observatory_ids.len(),
                date_range
            );
            self.source
                .climate_records(&observatory_ids, date_range, category)
                .await?
        };

        let joined = join(table, &results, &records, date_range, category, &self.index)?;
        info!("Match summary: {}", joined.match_summary());
        Ok(joined)
    }
}

impl Amedas<FrameSource> {
    /// Reads the observatory table and the daily table from local `.csv`,
    /// `.csv.gz` or `.parquet` files.
    pub async fn from_files(
        observatories: impl Into<PathBuf>,
        daily: impl Into<PathBuf>,
    ) -> Result<Self, AmedasError> {
        let source = FrameSource::builder()
            .observatories(DataLocation::File(observatories.into()))
            .daily(DataLocation::File(daily.into()))
            .build()?;
        Self::with_source(source).await
    }

    /// Downloads both tables. Downloads are cached as Parquet under the user's
    /// cache directory.
    pub async fn from_urls(
        observatories_url: impl Into<String>,
        daily_url: impl Into<String>,
    ) -> Result<Self, AmedasError> {
        let cache_dir = get_cache_dir()?;
        ensure_cache_dir_exists(&cache_dir).await?;
        let source = FrameSource::builder()
            .observatories(DataLocation::Url(observatories_url.into()))
            .daily(DataLocation::Url(daily_url.into()))
            .cache_dir(cache_dir)
            .build()?;
        Self::with_source(source).await
    }

    pub async fn from_config(config: &SourceConfig) -> Result<Self, AmedasError> {
        if let Some(dir) = &config.cache_dir {
            ensure_cache_dir_exists(dir).await?;
        }
        let source = FrameSource::from_config(config)?;
        Self::with_source_and_mode(source, config.match_mode).await
    }
}

fn check_column_collisions(
    table: &InputTable,
    category: DataCategory,
) -> Result<(), ConfigurationError> {
    let collision = table.columns().iter().find(|c| {
        JOIN_COLUMNS.contains(&c.name.as_str()) || c.name == category.column_name()
    });
    match collision {
        Some(column) => Err(ConfigurationError::ColumnCollision(column.name.clone())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate::error::FetchError;
    use crate::climate::source::InMemorySource;
    use crate::types::climate_record::ClimateRecord;
    use crate::types::match_result::MatchLevel;
    use crate::types::observatory::ObservatoryReference;
    use chrono::NaiveDate;

    fn ymd(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn references() -> Vec<ObservatoryReference> {
        vec![
            ObservatoryReference::new("東京", "東京都"),
            ObservatoryReference::new("渋谷", "東京都渋谷区"),
            ObservatoryReference::new("横浜", "神奈川県横浜市"),
        ]
    }

    async fn amedas_with(records: Vec<ClimateRecord>) -> Amedas<InMemorySource> {
        Amedas::with_source(InMemorySource::new(references(), records))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_legacy_address_end_to_end() -> Result<(), AmedasError> {
        let amedas = amedas_with(vec![ClimateRecord::new(
            "渋谷",
            ymd(1),
            DataCategory::Rainfall,
            Some(3.2),
        )])
        .await;
        let table = InputTable::from_text_rows(&["ADDRESS"], [["東京都澁谷區道玄坂２丁目１番１号"]])?;

        let joined = amedas
            .process_input_data()
            .table(&table)
            .address_column("ADDRESS")
            .category(DataCategory::Rainfall)
            .date_range(DateRange::new("2024-01-01", "2024-01-02")?)
            .call()
            .await?;

        assert_eq!(joined.len(), 2);
        let values: Vec<_> = joined.rows().iter().map(|r| (r.date, r.value)).collect();
        assert_eq!(values, vec![(Some(ymd(1)), Some(3.2)), (Some(ymd(2)), None)]);
        assert!(joined
            .rows()
            .iter()
            .all(|r| r.observatory_id == Some(ObservatoryId::from("渋谷"))));
        Ok(())
    }

    #[tokio::test]
    async fn test_single_fetch_with_distinct_ids() -> Result<(), AmedasError> {
        let amedas = amedas_with(vec![]).await;
        let table = InputTable::from_text_rows(
            &["ADDRESS"],
            [
                ["神奈川県横浜市中区1-1"],
                ["東京都渋谷区神南1-1"],
                ["東京都新宿区西新宿2-8-1"],
                ["東京都渋谷区宇田川町3"],
                ["大阪府大阪市北区梅田1"],
            ],
        )?;

        let joined = amedas
            .process_input_data()
            .table(&table)
            .address_column("ADDRESS")
            .category(DataCategory::Rainfall)
            .date_range(DateRange::new("2024-01-01", "2024-01-03")?)
            .call()
            .await?;

        assert_eq!(amedas.source().climate_request_count(), 1);
        assert_eq!(
            amedas.source().last_requested_ids(),
            Some(vec![
                ObservatoryId::from("東京"),
                ObservatoryId::from("横浜"),
                ObservatoryId::from("渋谷"),
            ])
        );
        // 4 matched rows over 3 days plus the unmatched Osaka row
        assert_eq!(joined.len(), 4 * 3 + 1);
        assert_eq!(joined.match_summary().count(MatchLevel::Unmatched), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_no_fetch_without_matches() -> Result<(), AmedasError> {
        let amedas = amedas_with(vec![]).await;
        let table = InputTable::from_text_rows(&["ADDRESS"], [["大阪府大阪市北区梅田1"], [""]])?;

        let joined = amedas
            .process_input_data()
            .table(&table)
            .address_column("ADDRESS")
            .category(DataCategory::SnowDepth)
            .date_range(DateRange::new("2024-01-01", "2024-12-31")?)
            .call()
            .await?;

        assert_eq!(amedas.source().climate_request_count(), 0);
        assert_eq!(joined.len(), 2);
        assert!(joined.rows().iter().all(|r| r.date.is_none() && r.value.is_none()));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_address_column() -> Result<(), AmedasError> {
        let amedas = amedas_with(vec![]).await;
        let table = InputTable::from_text_rows(&["住所"], [["東京都渋谷区"]])?;
        let err = amedas
            .process_input_data()
            .table(&table)
            .address_column("ADDRESS")
            .category(DataCategory::Rainfall)
            .date_range(DateRange::new("2024-01-01", "2024-01-01")?)
            .call()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AmedasError::Configuration(ConfigurationError::UnknownAddressColumn { ref column, .. })
                if column == "ADDRESS"
        ));
        assert_eq!(amedas.source().climate_request_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_output_column_collision() -> Result<(), AmedasError> {
        let amedas = amedas_with(vec![]).await;
        for taken in ["DATE", "DISPLAY_NAME", "RAINFALL_DAILY_TOTAL"] {
            let table = InputTable::from_text_rows(&["ADDRESS", taken], [["東京都渋谷区", "x"]])?;
            let err = amedas
                .process_input_data()
                .table(&table)
                .address_column("ADDRESS")
                .category(DataCategory::Rainfall)
                .date_range(DateRange::new("2024-01-01", "2024-01-01")?)
                .call()
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                AmedasError::Configuration(ConfigurationError::ColumnCollision(ref c)) if c == taken
            ));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() -> Result<(), AmedasError> {
        let source = InMemorySource::new(references(), vec![]).failing("connection reset");
        let amedas = Amedas::with_source(source).await?;
        let table = InputTable::from_text_rows(&["ADDRESS"], [["東京都渋谷区神南1-1"]])?;
        let err = amedas
            .process_input_data()
            .table(&table)
            .address_column("ADDRESS")
            .category(DataCategory::Rainfall)
            .date_range(DateRange::new("2024-01-01", "2024-01-01")?)
            .call()
            .await
            .unwrap_err();
        assert!(matches!(err, AmedasError::Fetch(FetchError::Collaborator(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_reference_is_rejected() {
        let mut refs = references();
        refs.push(ObservatoryReference::new("渋谷", "東京都澁谷區"));
        let result = Amedas::with_source(InMemorySource::new(refs, vec![])).await;
        assert!(matches!(
            result,
            Err(AmedasError::Configuration(ConfigurationError::DuplicateReference { .. }))
        ));
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        let err = DateRange::new("2024-02-01", "2024-01-01").unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidDateRange { .. }));
    }

    #[tokio::test]
    async fn test_find_observatory_prefix_mode() -> Result<(), AmedasError> {
        let amedas =
            Amedas::with_source_and_mode(InMemorySource::new(references(), vec![]), MatchMode::Prefix)
                .await?;
        assert!(amedas.find_observatory("東京都渋谷区神南1").is_matched());
        // Prefix mode does not look inside the address
        assert!(!amedas.find_observatory("日本国東京都渋谷区神南1").is_matched());
        assert_eq!(amedas.index().mode(), MatchMode::Prefix);
        Ok(())
    }

    #[tokio::test]
    async fn test_from_files() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let observatories = dir.path().join("observatories.csv");
        let daily = dir.path().join("daily.csv");
        std::fs::write(
            &observatories,
            "ADDRESS_NAME,NEAREST_OBSERVATORY,DISPLAY_NAME\n東京都千代田区,東京,東京\n",
        )?;
        std::fs::write(
            &daily,
            "OBSERVATORY_NAME,DATE,RAINFALL_DAILY_TOTAL\n東京,2024-01-01,3.2\n東京,2024-01-02,0.0\n",
        )?;

        let amedas = Amedas::from_files(&observatories, &daily).await?;
        let table = InputTable::from_text_rows(&["ADDRESS"], [["東京都千代田区大手町1-3-4"]])?;
        let joined = amedas
            .process_input_data()
            .table(&table)
            .address_column("ADDRESS")
            .category(DataCategory::Rainfall)
            .date_range(DateRange::new("2024-01-01", "2024-01-02")?)
            .call()
            .await?;
        let values: Vec<_> = joined.rows().iter().map(|r| r.value).collect();
        assert_eq!(values, vec![Some(3.2), Some(0.0)]);
        Ok(())
    }
}
