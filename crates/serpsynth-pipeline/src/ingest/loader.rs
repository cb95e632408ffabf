//! RawLoader: backfill raw_search_metrics over a lookback window.

use chrono::{Duration, NaiveDate};
use serpsynth_core::errors::PipelineError;
use serpsynth_core::types::Device;
use serpsynth_storage::queries::raw;
use serpsynth_storage::DatabaseManager;

use super::SearchAnalyticsSource;

/// Rows inserted per loaded date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub loaded: Vec<(NaiveDate, usize)>,
}

impl SyncReport {
    pub fn total(&self) -> usize {
        self.loaded.iter().map(|(_, n)| n).sum()
    }
}

pub struct RawLoader<'a, S: ?Sized> {
    db: &'a DatabaseManager,
    source: &'a S,
    devices: Vec<Device>,
    days_back: u32,
}

impl<'a, S: SearchAnalyticsSource + ?Sized> RawLoader<'a, S> {
    pub fn new(db: &'a DatabaseManager, source: &'a S, devices: Vec<Device>, days_back: u32) -> Self {
        Self {
            db,
            source,
            devices,
            days_back,
        }
    }

    /// `[today - days_back, today - 1]`.
    pub fn lookback_window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        (
            today - Duration::days(i64::from(self.days_back)),
            today - Duration::days(1),
        )
    }

    /// Dates in the lookback window with no raw rows, ascending.
    pub fn missing_dates(&self, today: NaiveDate) -> Result<Vec<NaiveDate>, PipelineError> {
        let (from, to) = self.lookback_window(today);
        let present = self
            .db
            .with_conn(|conn| raw::dates_in_range(conn, from, to))?;
        Ok(from
            .iter_days()
            .take_while(|d| *d <= to)
            .filter(|d| !present.contains(d))
            .collect())
    }

    /// Fetch every configured device for `date` and insert the records,
    /// skipping natural keys already present. Returns rows inserted.
    pub fn load_date(&self, date: NaiveDate) -> Result<usize, PipelineError> {
        let mut inserted = 0;
        for &device in &self.devices {
            let records = self.source.fetch_day(date, device)?;
            if records.is_empty() {
                continue;
            }
            let fetched = records.len();
            let written = self.db.with_transaction(|tx| {
                let mut n = 0;
                for record in &records {
                    if raw::insert_ignore(tx, record)? {
                        n += 1;
                    }
                }
                Ok(n)
            })?;
            tracing::debug!(%date, %device, fetched, written, "loaded raw records");
            inserted += written;
        }
        Ok(inserted)
    }

    /// Load every missing date in the lookback window.
    pub fn sync(&self, today: NaiveDate) -> Result<SyncReport, PipelineError> {
        let missing = self.missing_dates(today)?;
        tracing::info!(missing = missing.len(), "raw dates to load");

        let mut report = SyncReport::default();
        for date in missing {
            let n = self.load_date(date)?;
            tracing::info!(%date, rows = n, "raw date loaded");
            report.loaded.push((date, n));
        }
        Ok(report)
    }
}
