use crate::error::ConfigurationError;
use crate::observatories::index::ObservatoryIndex;
use crate::types::climate_record::ClimateRecord;
use crate::types::data_category::DataCategory;
use crate::types::date_range::DateRange;
use crate::types::input_table::{InputTable, RowId};
use crate::types::joined_table::{JoinedRow, JoinedTable};
use crate::types::match_result::{MatchResult, MatchSummary};
use chrono::NaiveDate;
use log::{debug, warn};
use std::collections::HashMap;

/// Joins `climate_records` onto `table`.
///
/// Every matched row fans out to one row per day of `date_range`, in date order.
/// Unmatched rows are kept once, without date or value.
///
/// `match_results` must hold exactly one result per row, in row order. Records of
/// another category or outside `date_range` are ignored. When several records share
/// an `(observatory, date)` key the first one wins.
pub fn join(
    table: &InputTable,
    match_results: &[MatchResult],
    climate_records: &[ClimateRecord],
    date_range: DateRange,
    category: DataCategory,
    index: &ObservatoryIndex,
) -> Result<JoinedTable, ConfigurationError> {
    check_alignment(table, match_results)?;
    let observations = first_seen_values(climate_records, date_range, category);

    let matched_rows = match_results.iter().filter(|r| r.is_matched()).count();
    let mut rows = Vec::with_capacity(
        matched_rows * date_range.len() + (match_results.len() - matched_rows),
    );

    for (input, result) in table.rows().iter().zip(match_results) {
        let Some(observatory_id) = &result.observatory_id else {
            rows.push(JoinedRow {
                row_id: input.id(),
                cells: input.cells().to_vec(),
                observatory_id: None,
                observatory_name: None,
                match_level: result.level,
                ambiguous: result.ambiguous,
                date: None,
                value: None,
            });
            continue;
        };

        let observatory_name = index.display_name(observatory_id.as_str()).map(str::to_string);
        for date in date_range.days() {
            rows.push(JoinedRow {
                row_id: input.id(),
                cells: input.cells().to_vec(),
                observatory_id: Some(observatory_id.clone()),
                observatory_name: observatory_name.clone(),
                match_level: result.level,
                ambiguous: result.ambiguous,
                date: Some(date),
                value: observations
                    .get(&(observatory_id.as_str(), date))
                    .copied()
                    .flatten(),
            });
        }
    }

    debug!(
        "Joined {} input rows ({} matched) into {} rows over {}",
        table.len(),
        matched_rows,
        rows.len(),
        date_range
    );
    Ok(JoinedTable::new(
        table.columns().to_vec(),
        rows,
        category,
        date_range,
        MatchSummary::from_results(match_results),
    ))
}

fn check_alignment(
    table: &InputTable,
    match_results: &[MatchResult],
) -> Result<(), ConfigurationError> {
    let aligned = table.len() == match_results.len()
        && table
            .rows()
            .iter()
            .zip(match_results)
            .all(|(row, result)| row.id() == result.row_id);
    if aligned {
        Ok(())
    } else {
        Err(ConfigurationError::MatchResultMismatch {
            rows: table.len(),
            results: match_results.len(),
        })
    }
}

fn first_seen_values(
    records: &[ClimateRecord],
    date_range: DateRange,
    category: DataCategory,
) -> HashMap<(&str, NaiveDate), Option<f64>> {
    let mut values = HashMap::with_capacity(records.len());
    let mut duplicates = 0usize;
    for record in records
        .iter()
        .filter(|r| r.category == category && date_range.contains(r.date))
    {
        let key = (record.observatory_id.as_str(), record.date);
        if values.contains_key(&key) {
            duplicates += 1;
        } else {
            values.insert(key, record.value);
        }
    }
    if duplicates > 0 {
        warn!(
            "Discarded {} duplicate {} observations (first value per observatory and day kept)",
            duplicates, category
        );
    }
    values
}

/// Rows of a joined table that belong to one input row.
pub fn rows_for(table: &JoinedTable, row_id: RowId) -> impl Iterator<Item = &JoinedRow> {
    table.rows().iter().filter(move |r| r.row_id == row_id)
}
