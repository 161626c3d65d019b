use crate::climate::error::FetchError;
use crate::types::climate_record::ClimateRecord;
use crate::types::data_category::DataCategory;
use crate::types::date_range::DateRange;
use crate::types::observatory::{ObservatoryId, ObservatoryReference};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Supplies reference data and daily observations.
///
/// Both calls are batched: a run makes at most one of each. Ids or dates the source
/// knows nothing about are simply absent from the result, never an error.
#[allow(async_fn_in_trait)]
pub trait ClimateSource {
    async fn observatories(&self) -> Result<Vec<ObservatoryReference>, FetchError>;

    async fn climate_records(
        &self,
        observatory_ids: &[ObservatoryId],
        range: DateRange,
        category: DataCategory,
    ) -> Result<Vec<ClimateRecord>, FetchError>;
}

/// A source backed by plain vectors. Records every climate request it receives.
#[derive(Debug, Default)]
pub struct InMemorySource {
    references: Vec<ObservatoryReference>,
    records: Vec<ClimateRecord>,
    failure: Option<String>,
    climate_requests: AtomicUsize,
    last_request: Mutex<Option<Vec<ObservatoryId>>>,
}

impl InMemorySource {
    pub fn new(references: Vec<ObservatoryReference>, records: Vec<ClimateRecord>) -> Self {
        Self {
            references,
            records,
            ..Self::default()
        }
    }

    /// Makes every climate request fail with [`FetchError::Collaborator`].
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// How many times [`ClimateSource::climate_records`] was called.
    pub fn climate_request_count(&self) -> usize {
        self.climate_requests.load(Ordering::SeqCst)
    }

    /// The ids of the most recent climate request.
    pub fn last_requested_ids(&self) -> Option<Vec<ObservatoryId>> {
        self.last_request.lock().ok().and_then(|last| last.clone())
    }
}

impl ClimateSource for InMemorySource {
    async fn observatories(&self) -> Result<Vec<ObservatoryReference>, FetchError> {
        Ok(self.references.clone())
    }

    async fn climate_records(
        &self,
        observatory_ids: &[ObservatoryId],
        range: DateRange,
        category: DataCategory,
    ) -> Result<Vec<ClimateRecord>, FetchError> {
        self.climate_requests.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(observatory_ids.to_vec());
        }
        if let Some(message) = &self.failure {
            return Err(FetchError::Collaborator(message.clone()));
        }

        let wanted: HashSet<&ObservatoryId> = observatory_ids.iter().collect();
        Ok(self
            .records
            .iter()
            .filter(|r| {
                r.category == category && range.contains(r.date) && wanted.contains(&r.observatory_id)
            })
            .cloned()
            .collect())
    }
}
