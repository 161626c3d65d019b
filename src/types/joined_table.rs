//! The augmented table returned by a run, and its exports.

use crate::error::AmedasError;
use crate::types::columns::{DATE, DISPLAY_NAME, JOIN_COLUMNS, MATCH_LEVEL, NEAREST_OBSERVATORY};
use crate::types::data_category::DataCategory;
use crate::types::date_range::DateRange;
use crate::types::input_table::{Cell, CellKind, ColumnSpec, RowId};
use crate::types::match_result::{level_label, MatchLevel, MatchSummary};
use crate::types::observatory::ObservatoryId;
use chrono::NaiveDate;
use log::info;
use polars::prelude::{Column, CsvWriter, DataFrame, SerWriter};
use serde_json::{Map, Value};
use std::path::Path;

/// One output row: an input row, the observatory it was matched to and one day of
/// observations. Unmatched input rows appear once, with `date` and `value` unset.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
    pub row_id: RowId,
    pub cells: Vec<Cell>,
    pub observatory_id: Option<ObservatoryId>,
    pub observatory_name: Option<String>,
    pub match_level: MatchLevel,
    pub ambiguous: bool,
    pub date: Option<NaiveDate>,
    pub value: Option<f64>,
}

impl JoinedRow {
    fn level_label(&self) -> String {
        level_label(self.match_level, self.ambiguous).into_owned()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinedTable {
    columns: Vec<ColumnSpec>,
    rows: Vec<JoinedRow>,
    category: DataCategory,
    date_range: DateRange,
    summary: MatchSummary,
}

impl JoinedTable {
    pub(crate) fn new(
        columns: Vec<ColumnSpec>,
        rows: Vec<JoinedRow>,
        category: DataCategory,
        date_range: DateRange,
        summary: MatchSummary,
    ) -> Self {
        Self {
            columns,
            rows,
            category,
            date_range,
            summary,
        }
    }

    /// Schema of the passed-through input columns.
    pub fn input_columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// All output column names in order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| c.name.clone())
            .chain(JOIN_COLUMNS.map(String::from))
            .chain(std::iter::once(self.category.column_name().to_string()))
            .collect()
    }

    pub fn rows(&self) -> &[JoinedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn category(&self) -> DataCategory {
        self.category
    }

    pub fn date_range(&self) -> DateRange {
        self.date_range
    }

    /// Row counts per match level over the input rows (not the joined rows).
    pub fn match_summary(&self) -> &MatchSummary {
        &self.summary
    }

    /// Builds a polars `DataFrame`.
    ///
    /// Input columns keep their declared kind. A cell whose variant does not fit its
    /// column kind becomes null, except in text columns, which render every cell.
    pub fn to_dataframe(&self) -> Result<DataFrame, AmedasError> {
        let mut columns: Vec<Column> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, spec)| self.input_column(i, spec))
            .collect();

        let observatories: Vec<Option<String>> = self
            .rows
            .iter()
            .map(|r| r.observatory_id.as_ref().map(|id| id.0.clone()))
            .collect();
        let names: Vec<Option<String>> =
            self.rows.iter().map(|r| r.observatory_name.clone()).collect();
        let levels: Vec<String> = self.rows.iter().map(JoinedRow::level_label).collect();
        let dates: Vec<Option<NaiveDate>> = self.rows.iter().map(|r| r.date).collect();
        let values: Vec<Option<f64>> = self.rows.iter().map(|r| r.value).collect();

        columns.push(Column::new(NEAREST_OBSERVATORY.into(), observatories));
        columns.push(Column::new(DISPLAY_NAME.into(), names));
        columns.push(Column::new(MATCH_LEVEL.into(), levels));
        columns.push(Column::new(DATE.into(), dates));
        columns.push(Column::new(self.category.column_name().into(), values));

        Ok(DataFrame::new(columns)?)
    }

    fn input_column(&self, index: usize, spec: &ColumnSpec) -> Column {
        let name = spec.name.as_str().into();
        let cells = self.rows.iter().map(|r| r.cells.get(index));
        match spec.kind {
            CellKind::Int => Column::new(
                name,
                cells
                    .map(|c| match c {
                        Some(Cell::Int(v)) => Some(*v),
                        _ => None,
                    })
                    .collect::<Vec<_>>(),
            ),
            CellKind::Float => Column::new(
                name,
                cells
                    .map(|c| match c {
                        Some(Cell::Float(v)) => Some(*v),
                        Some(Cell::Int(v)) => Some(*v as f64),
                        _ => None,
                    })
                    .collect::<Vec<_>>(),
            ),
            CellKind::Bool => Column::new(
                name,
                cells
                    .map(|c| match c {
                        Some(Cell::Bool(v)) => Some(*v),
                        _ => None,
                    })
                    .collect::<Vec<_>>(),
            ),
            CellKind::Text => Column::new(
                name,
                cells
                    .map(|c| c.filter(|c| !c.is_null()).map(|c| c.to_text().into_owned()))
                    .collect::<Vec<_>>(),
            ),
        }
    }

    /// Writes the table as CSV with a header row.
    pub fn write_csv(&self, path: &Path) -> Result<(), AmedasError> {
        let mut df = self.to_dataframe()?;
        let mut file = std::fs::File::create(path)
            .map_err(|e| AmedasError::ExportIo(path.to_path_buf(), e))?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)?;
        info!("Wrote {} rows to {}", df.height(), path.display());
        Ok(())
    }

    /// One JSON object per row, keyed by output column name.
    pub fn to_json_records(&self) -> Result<Vec<Value>, AmedasError> {
        let value_column = self.category.column_name();
        self.rows
            .iter()
            .map(|row| -> Result<Value, AmedasError> {
                let mut record = Map::new();
                for (spec, cell) in self.columns.iter().zip(&row.cells) {
                    record.insert(spec.name.clone(), serde_json::to_value(cell)?);
                }
                record.insert(
                    NEAREST_OBSERVATORY.to_string(),
                    serde_json::to_value(&row.observatory_id)?,
                );
                record.insert(
                    DISPLAY_NAME.to_string(),
                    serde_json::to_value(&row.observatory_name)?,
                );
                record.insert(MATCH_LEVEL.to_string(), Value::String(row.level_label()));
                record.insert(
                    DATE.to_string(),
                    row.date
                        .map_or(Value::Null, |d| Value::String(d.format("%Y-%m-%d").to_string())),
                );
                record.insert(value_column.to_string(), serde_json::to_value(row.value)?);
                Ok(Value::Object(record))
            })
            .collect()
    }

    pub fn to_json_string(&self) -> Result<String, AmedasError> {
        Ok(serde_json::to_string_pretty(&self.to_json_records()?)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<(), AmedasError> {
        let json = self.to_json_string()?;
        std::fs::write(path, json).map_err(|e| AmedasError::ExportIo(path.to_path_buf(), e))
    }
}
