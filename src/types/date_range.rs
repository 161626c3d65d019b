use crate::error::ConfigurationError;
use crate::types::calendar::{Month, Year};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Something that resolves to a span of calendar days.
///
/// A single `NaiveDate` resolves to itself, a [`Year`] or [`Month`] to its first
/// and last day. [`DateRange::new`] takes the *start* of its first argument and the
/// *end* of its second, so `DateRange::new(Year(2023), Year(2024))` covers two years.
pub trait AnyDate {
    fn date_bounds(self) -> Option<(NaiveDate, NaiveDate)>;
}

impl AnyDate for NaiveDate {
    fn date_bounds(self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self, self))
    }
}

impl AnyDate for &str {
    fn date_bounds(self) -> Option<(NaiveDate, NaiveDate)> {
        NaiveDate::parse_from_str(self.trim(), "%Y-%m-%d")
            .ok()
            .and_then(AnyDate::date_bounds)
    }
}

impl AnyDate for String {
    fn date_bounds(self) -> Option<(NaiveDate, NaiveDate)> {
        self.as_str().date_bounds()
    }
}

impl AnyDate for Year {
    fn date_bounds(self) -> Option<(NaiveDate, NaiveDate)> {
        Some((
            NaiveDate::from_ymd_opt(self.0, 1, 1)?,
            NaiveDate::from_ymd_opt(self.0, 12, 31)?,
        ))
    }
}

impl AnyDate for Month {
    fn date_bounds(self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.first_day()?, self.last_day()?))
    }
}

/// A span of days that stands on its own, without a second bound.
///
/// [`DateRange::from_period`] turns it into a range. A `(start, end)` tuple of dates
/// is a period too, validated like [`DateRange::from_dates`].
pub trait DatePeriod {
    fn get_date_period(self) -> Option<(NaiveDate, NaiveDate)>;
}

impl DatePeriod for NaiveDate {
    fn get_date_period(self) -> Option<(NaiveDate, NaiveDate)> {
        self.date_bounds()
    }
}

impl DatePeriod for Year {
    fn get_date_period(self) -> Option<(NaiveDate, NaiveDate)> {
        self.date_bounds()
    }
}

impl DatePeriod for Month {
    fn get_date_period(self) -> Option<(NaiveDate, NaiveDate)> {
        self.date_bounds()
    }
}

impl DatePeriod for (NaiveDate, NaiveDate) {
    fn get_date_period(self) -> Option<(NaiveDate, NaiveDate)> {
        Some(self)
    }
}

/// An inclusive `[start, end]` range of days. `start <= end` always holds, also for
/// ranges read through serde.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = ConfigurationError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        DateRange::from_dates(raw.start, raw.end)
    }
}

impl DateRange {
    /// Builds a range from the start of `start` to the end of `end`.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::DateParsing`] if a bound cannot be resolved and
    /// [`ConfigurationError::InvalidDateRange`] if the start lies after the end.
    ///
    /// # Examples
    ///
    /// ```
    /// use amedas::{DateRange, Month};
    /// use chrono::NaiveDate;
    ///
    /// let range = DateRange::new("2024-01-30", Month::new(2, 2024)).unwrap();
    /// assert_eq!(range.start(), NaiveDate::from_ymd_opt(2024, 1, 30).unwrap());
    /// assert_eq!(range.end(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    /// assert_eq!(range.len(), 31);
    /// ```
    pub fn new(
        start: impl AnyDate + fmt::Debug + Clone,
        end: impl AnyDate + fmt::Debug + Clone,
    ) -> Result<Self, ConfigurationError> {
        let (start_date, _) = start
            .clone()
            .date_bounds()
            .ok_or_else(|| ConfigurationError::DateParsing(format!("{:?}", start)))?;
        let (_, end_date) = end
            .clone()
            .date_bounds()
            .ok_or_else(|| ConfigurationError::DateParsing(format!("{:?}", end)))?;
        Self::from_dates(start_date, end_date)
    }

    /// A range covering exactly one period, e.g. `DateRange::period(Year(2023))`.
    pub fn period(period: impl AnyDate + fmt::Debug + Clone) -> Result<Self, ConfigurationError> {
        Self::new(period.clone(), period)
    }

    /// Builds a range from a [`DatePeriod`].
    ///
    /// ```
    /// use amedas::{DateRange, Month};
    ///
    /// let february = DateRange::from_period(Month::new(2, 2023)).unwrap();
    /// assert_eq!(february.len(), 28);
    /// ```
    pub fn from_period(period: impl DatePeriod + fmt::Debug + Clone) -> Result<Self, ConfigurationError> {
        let (start, end) = period
            .clone()
            .get_date_period()
            .ok_or_else(|| ConfigurationError::DateParsing(format!("{:?}", period)))?;
        Self::from_dates(start, end)
    }

    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self, ConfigurationError> {
        if start > end {
            return Err(ConfigurationError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days in the range, both ends included. Never zero.
    pub fn len(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Every day of the range in ascending order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.len() as u64).filter_map(move |offset| self.start.checked_add_days(Days::new(offset)))
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}
