//! The upstream search-analytics boundary.

use chrono::NaiveDate;
use serpsynth_core::errors::SourceError;
use serpsynth_core::types::{Device, SourceRecord};

/// Supplies daily per-query, per-page metrics for one device category.
pub trait SearchAnalyticsSource {
    fn fetch_day(&self, date: NaiveDate, device: Device) -> Result<Vec<SourceRecord>, SourceError>;
}

/// In-memory source.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<SourceRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<SourceRecord>) -> Self {
        Self { records }
    }
}

impl SearchAnalyticsSource for StaticSource {
    fn fetch_day(&self, date: NaiveDate, device: Device) -> Result<Vec<SourceRecord>, SourceError> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.date == date && r.device == device)
            .cloned()
            .collect())
    }
}
