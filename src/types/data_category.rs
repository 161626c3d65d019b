//! Defines the categories of daily AMeDAS observations that can be joined onto a table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A kind of daily observation.
///
/// Each category maps to one value column in the daily observation table and to the
/// name of the value column in the joined output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataCategory {
    /// Total precipitation of the day, in mm.
    Rainfall,
    /// Mean air temperature of the day, in °C.
    TemperatureAverage,
    /// Highest air temperature of the day, in °C.
    TemperatureMax,
    /// Lowest air temperature of the day, in °C.
    TemperatureMin,
    /// Hours of sunshine.
    SunshineDuration,
    /// Mean wind speed, in m/s.
    WindSpeedAverage,
    /// Deepest snow cover of the day, in cm.
    SnowDepth,
}

impl DataCategory {
    pub const ALL: [DataCategory; 7] = [
        DataCategory::Rainfall,
        DataCategory::TemperatureAverage,
        DataCategory::TemperatureMax,
        DataCategory::TemperatureMin,
        DataCategory::SunshineDuration,
        DataCategory::WindSpeedAverage,
        DataCategory::SnowDepth,
    ];

    /// Stable lowercase identifier, also accepted by [`FromStr`].
    pub fn key(&self) -> &'static str {
        match self {
            DataCategory::Rainfall => "rainfall",
            DataCategory::TemperatureAverage => "temperature_average",
            DataCategory::TemperatureMax => "temperature_max",
            DataCategory::TemperatureMin => "temperature_min",
            DataCategory::SunshineDuration => "sunshine_duration",
            DataCategory::WindSpeedAverage => "wind_speed_average",
            DataCategory::SnowDepth => "snow_depth",
        }
    }

    /// Column holding this category in the daily table, reused as the output column name.
    pub fn column_name(&self) -> &'static str {
        match self {
            DataCategory::Rainfall => "RAINFALL_DAILY_TOTAL",
            DataCategory::TemperatureAverage => "TEMPERATURE_DAILY_AVERAGE",
            DataCategory::TemperatureMax => "TEMPERATURE_DAILY_MAX",
            DataCategory::TemperatureMin => "TEMPERATURE_DAILY_MIN",
            DataCategory::SunshineDuration => "SUNSHINE_DAILY_HOURS",
            DataCategory::WindSpeedAverage => "WIND_SPEED_DAILY_AVERAGE",
            DataCategory::SnowDepth => "SNOW_DEPTH_DAILY_MAX",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            DataCategory::Rainfall => "mm",
            DataCategory::TemperatureAverage
            | DataCategory::TemperatureMax
            | DataCategory::TemperatureMin => "°C",
            DataCategory::SunshineDuration => "h",
            DataCategory::WindSpeedAverage => "m/s",
            DataCategory::SnowDepth => "cm",
        }
    }
}

/// Formats a `DataCategory` using its [`key`](DataCategory::key).
///
/// # Examples
///
/// ```
/// use amedas::DataCategory;
///
/// assert_eq!(DataCategory::Rainfall.to_string(), "rainfall");
/// assert_eq!("temperature_max".parse::<DataCategory>().unwrap(), DataCategory::TemperatureMax);
/// ```
impl fmt::Display for DataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown data category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for DataCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        DataCategory::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(wanted) || c.column_name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}
