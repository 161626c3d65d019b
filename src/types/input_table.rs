use crate::climate::data_loader::read_csv_file;
use crate::climate::error::FetchError;
use crate::error::ConfigurationError;
use polars::prelude::{Column, DataFrame, DataType, PolarsResult};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::Path;

/// Stable identifier of an input row: its position in the original table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub usize);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Int,
    Float,
    Bool,
    Text,
}

/// A single value of the input table. Passed through the pipeline untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Cell {
    /// Text rendering used when a cell is read as an address. Null reads as empty.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Cell::Null => Cow::Borrowed(""),
            Cell::Int(v) => Cow::Owned(v.to_string()),
            Cell::Float(v) => Cow::Owned(v.to_string()),
            Cell::Bool(v) => Cow::Owned(v.to_string()),
            Cell::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: CellKind,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: CellKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputRow {
    id: RowId,
    cells: Vec<Cell>,
}

impl InputRow {
    pub fn id(&self) -> RowId {
        self.id
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }
}

/// The table chosen by the user, with an explicit column schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InputTable {
    columns: Vec<ColumnSpec>,
    rows: Vec<InputRow>,
}

impl InputTable {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds an all-text table, convenient for addresses typed in by hand.
    ///
    /// # Examples
    ///
    /// ```
    /// use amedas::InputTable;
    ///
    /// let table = InputTable::from_text_rows(
    ///     &["STORE", "ADDRESS"],
    ///     [["Shibuya", "東京都渋谷区道玄坂2-1-1"], ["Umeda", "大阪府大阪市北区梅田1-2-3"]],
    /// )
    /// .unwrap();
    /// assert_eq!(table.len(), 2);
    /// assert_eq!(table.column_index("ADDRESS"), Some(1));
    /// ```
    pub fn from_text_rows<R, S>(
        columns: &[&str],
        rows: impl IntoIterator<Item = R>,
    ) -> Result<Self, ConfigurationError>
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(
            columns
                .iter()
                .map(|name| ColumnSpec::new(*name, CellKind::Text))
                .collect(),
        );
        for row in rows {
            table.push_row(row.into_iter().map(|s| Cell::Text(s.into())).collect())?;
        }
        Ok(table)
    }

    /// Appends a row and returns its id.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::RowWidth`] if the number of cells differs from the schema.
    pub fn push_row(&mut self, cells: Vec<Cell>) -> Result<RowId, ConfigurationError> {
        if cells.len() != self.columns.len() {
            return Err(ConfigurationError::RowWidth {
                expected: self.columns.len(),
                found: cells.len(),
            });
        }
        let id = RowId(self.rows.len());
        self.rows.push(InputRow { id, cells });
        Ok(id)
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Resolves the address column, failing when the table does not have it.
    pub fn address_column_index(&self, name: &str) -> Result<usize, ConfigurationError> {
        self.column_index(name)
            .ok_or_else(|| ConfigurationError::UnknownAddressColumn {
                column: name.to_string(),
                available: self.column_names(),
            })
    }

    pub fn rows(&self) -> &[InputRow] {
        &self.rows
    }

    pub fn row(&self, id: RowId) -> Option<&InputRow> {
        self.rows.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Converts a polars `DataFrame`. Integer, float and boolean columns keep their
    /// type, every other column is read as text.
    pub fn from_dataframe(df: &DataFrame) -> PolarsResult<Self> {
        let mut columns = Vec::with_capacity(df.width());
        let mut values: Vec<Vec<Cell>> = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            let (kind, cells) = column_cells(column)?;
            columns.push(ColumnSpec::new(column.name().to_string(), kind));
            values.push(cells);
        }

        let rows = (0..df.height())
            .map(|i| InputRow {
                id: RowId(i),
                cells: values
                    .iter()
                    .map(|cells| cells.get(i).cloned().unwrap_or(Cell::Null))
                    .collect(),
            })
            .collect();
        Ok(Self { columns, rows })
    }

    /// Reads a CSV file with a header row.
    pub fn from_csv_path(path: &Path) -> Result<Self, FetchError> {
        let df = read_csv_file(path)?;
        Self::from_dataframe(&df).map_err(FetchError::DataFrameProcessing)
    }
}

fn column_cells(column: &Column) -> PolarsResult<(CellKind, Vec<Cell>)> {
    let dtype = column.dtype();
    if matches!(dtype, DataType::Boolean) {
        let cells = column
            .bool()?
            .into_iter()
            .map(|v| v.map_or(Cell::Null, Cell::Bool))
            .collect();
        return Ok((CellKind::Bool, cells));
    }
    if dtype.is_integer() {
        let cast = column.cast(&DataType::Int64)?;
        let cells = cast
            .i64()?
            .into_iter()
            .map(|v| v.map_or(Cell::Null, Cell::Int))
            .collect();
        return Ok((CellKind::Int, cells));
    }
    if dtype.is_float() {
        let cast = column.cast(&DataType::Float64)?;
        let cells = cast
            .f64()?
            .into_iter()
            .map(|v| v.map_or(Cell::Null, Cell::Float))
            .collect();
        return Ok((CellKind::Float, cells));
    }
    let cast = column.cast(&DataType::String)?;
    let cells = cast
        .str()?
        .into_iter()
        .map(|v| v.map_or(Cell::Null, |s| Cell::Text(s.to_string())))
        .collect();
    Ok((CellKind::Text, cells))
}
