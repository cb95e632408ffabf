//! Record types for the raw, aggregated, position and click tables.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Device;

/// One daily metric row as yielded by an upstream source client.
/// Metrics the upstream omitted stay `None` and land as NULL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub date: NaiveDate,
    pub query: String,
    pub page_path: String,
    pub device: Device,
    #[serde(default)]
    pub demand: Option<i64>,
    #[serde(default)]
    pub impressions: Option<i64>,
    #[serde(default)]
    pub clicks: Option<i64>,
    #[serde(default)]
    pub position: Option<f64>,
}

/// A loosely typed metric cell read back from the raw table.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

/// A raw-table row awaiting aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub date: NaiveDate,
    pub query: String,
    pub page_path: String,
    pub device: String,
    pub demand: RawValue,
    pub impressions: RawValue,
    pub clicks: RawValue,
    pub position: RawValue,
}

/// A canonical aggregated fact.
///
/// Invariants: `demand >= impressions`, `clicks <= impressions`, all metrics
/// non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRecord {
    pub id: i64,
    pub date: NaiveDate,
    pub query: String,
    pub page_path: String,
    pub device: Device,
    pub demand: i64,
    pub impressions: i64,
    pub clicks: i64,
    pub position: f64,
}

/// One synthetic impression of an aggregated fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionSample {
    pub id: i64,
    pub impression_position: u32,
    pub impression_order: u32,
}

/// One synthetic click, attributed to an impression by `(id, impression_order)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickSample {
    pub id: i64,
    pub click_position: u32,
    pub impression_order: u32,
}

impl From<&PositionSample> for ClickSample {
    fn from(impression: &PositionSample) -> Self {
        Self {
            id: impression.id,
            click_position: impression.impression_position,
            impression_order: impression.impression_order,
        }
    }
}
