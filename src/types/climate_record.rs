use crate::types::data_category::DataCategory;
use crate::types::observatory::ObservatoryId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single daily observation as delivered by a [`crate::ClimateSource`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateRecord {
    pub observatory_id: ObservatoryId,
    pub date: NaiveDate,
    pub category: DataCategory,
    /// `None` when the observatory reported the day without a usable value.
    pub value: Option<f64>,
}

impl ClimateRecord {
    pub fn new(
        observatory_id: impl Into<ObservatoryId>,
        date: NaiveDate,
        category: DataCategory,
        value: Option<f64>,
    ) -> Self {
        Self {
            observatory_id: observatory_id.into(),
            date,
            category,
            value,
        }
    }
}
