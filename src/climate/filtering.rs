use crate::types::columns::{DATE, OBSERVATORY_NAME};
use crate::types::data_category::DataCategory;
use crate::types::date_range::DateRange;
use polars::prelude::{col, lit, DataType, Expr, LazyFrame};

/// `DATE` as `YYYY-MM-DD` text, whether the column holds dates, datetimes or strings.
/// Datetimes render as `YYYY-MM-DD hh:mm:ss`, so the day is the first ten characters.
pub(crate) fn day_key() -> Expr {
    col(DATE)
        .cast(DataType::String)
        .str()
        .slice(lit(0i64), lit(10u64))
}

pub trait AmedasFrameFilterExt {
    /// Filters a daily LazyFrame to the days of `range` (inclusive).
    /// The `DATE` column may be a Date, a Datetime or an ISO `YYYY-MM-DD` string.
    ///
    /// Potential type errors occur during execution (e.g., `collect`).
    fn filter_daily(self, range: &DateRange) -> LazyFrame;

    /// Keeps the observatory key, the day and the value column of `category`,
    /// as String, `YYYY-MM-DD` String and Float64.
    fn select_category(self, category: DataCategory) -> LazyFrame;
}

impl AmedasFrameFilterExt for LazyFrame {
    fn filter_daily(self, range: &DateRange) -> LazyFrame {
        let start = range.start().format("%Y-%m-%d").to_string();
        let end = range.end().format("%Y-%m-%d").to_string();
        // ISO dates order the same way as strings
        self.filter(day_key().gt_eq(lit(start)).and(day_key().lt_eq(lit(end))))
    }

    fn select_category(self, category: DataCategory) -> LazyFrame {
        self.select([
            col(OBSERVATORY_NAME).cast(DataType::String),
            day_key().alias(DATE),
            col(category.column_name()).cast(DataType::Float64),
        ])
    }
}
