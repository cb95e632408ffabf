//! Aggregator: raw upstream rows → canonical aggregated facts with stable ids.

use chrono::NaiveDate;
use serpsynth_core::errors::StageError;
use serpsynth_core::types::{AggregatedRecord, Device, RawRow, RawValue};
use serpsynth_storage::queries::{aggregated, raw};
use serpsynth_storage::DatabaseManager;

use super::positions::MAX_AVERAGE_POSITION;
use super::EtlStage;

const STAGE: &str = "aggregated";

/// A reconciled fact that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedDraft {
    pub date: NaiveDate,
    pub query: String,
    pub page_path: String,
    pub device: Device,
    pub demand: i64,
    pub impressions: i64,
    pub clicks: i64,
    pub position: f64,
}

impl AggregatedDraft {
    pub fn into_record(self, id: i64) -> AggregatedRecord {
        AggregatedRecord {
            id,
            date: self.date,
            query: self.query,
            page_path: self.page_path,
            device: self.device,
            demand: self.demand,
            impressions: self.impressions,
            clicks: self.clicks,
            position: self.position,
        }
    }
}

pub struct Aggregator<'a> {
    db: &'a DatabaseManager,
}

impl<'a> Aggregator<'a> {
    pub fn new(db: &'a DatabaseManager) -> Self {
        Self { db }
    }
}

impl EtlStage for Aggregator<'_> {
    const NAME: &'static str = STAGE;

    type Item = RawRow;
    type Output = AggregatedDraft;

    fn extract(&mut self) -> Result<Vec<RawRow>, StageError> {
        self.db
            .with_conn(|conn| {
                let watermark = aggregated::max_date(conn)?;
                tracing::debug!(watermark = ?watermark, "aggregated watermark");
                raw::select_since_watermark(conn, watermark)
            })
            .map_err(StageError::extraction(Self::NAME))
    }

    fn transform(&mut self, items: &[RawRow]) -> Result<Vec<AggregatedDraft>, StageError> {
        items.iter().map(reconcile_metrics).collect()
    }

    fn load(&mut self, rows: Vec<AggregatedDraft>) -> Result<usize, StageError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let written = rows.len();
        let (first, last) = self
            .db
            .with_transaction(|tx| {
                let base = aggregated::max_id(tx)?;
                let mut id = base;
                for draft in rows {
                    id += 1;
                    aggregated::insert(tx, &draft.into_record(id))?;
                }
                Ok((base + 1, id))
            })
            .map_err(StageError::load(Self::NAME))?;

        tracing::info!(first_id = first, last_id = last, "assigned aggregated ids");
        Ok(written)
    }
}

/// Coerce a raw row's metrics and enforce the aggregated invariants:
/// missing metrics become zero, demand is raised to impressions, clicks are
/// capped at impressions.
pub fn reconcile_metrics(row: &RawRow) -> Result<AggregatedDraft, StageError> {
    let device: Device = row
        .device
        .parse()
        .map_err(|e: String| StageError::transformation(STAGE, e))?;

    let demand = count_metric("demand", &row.demand)?;
    let impressions = count_metric("impressions", &row.impressions)?;
    let clicks = count_metric("clicks", &row.clicks)?;
    let position = position_metric(&row.position)?;

    if demand < impressions {
        tracing::debug!(query = %row.query, demand, impressions, "raising demand to impressions");
    }
    if clicks > impressions {
        tracing::debug!(query = %row.query, clicks, impressions, "capping clicks at impressions");
    }

    Ok(AggregatedDraft {
        date: row.date,
        query: row.query.clone(),
        page_path: row.page_path.clone(),
        device,
        demand: demand.max(impressions),
        impressions,
        clicks: clicks.min(impressions),
        position,
    })
}

fn count_metric(name: &str, value: &RawValue) -> Result<i64, StageError> {
    let n = match value {
        RawValue::Null => 0,
        RawValue::Integer(i) => *i,
        RawValue::Real(f) => truncate(name, *f)?,
        RawValue::Text(t) => {
            let t = t.trim();
            if t.is_empty() {
                0
            } else if let Ok(i) = t.parse::<i64>() {
                i
            } else if let Ok(f) = t.parse::<f64>() {
                truncate(name, f)?
            } else {
                return Err(invalid(name, format!("not a number: {t:?}")));
            }
        }
    };
    if n < 0 {
        return Err(invalid(name, format!("negative value {n}")));
    }
    Ok(n)
}

fn truncate(name: &str, f: f64) -> Result<i64, StageError> {
    if !f.is_finite() || f.abs() >= i64::MAX as f64 {
        return Err(invalid(name, format!("out of range: {f}")));
    }
    Ok(f.trunc() as i64)
}

fn position_metric(value: &RawValue) -> Result<f64, StageError> {
    let p = match value {
        RawValue::Null => 0.0,
        RawValue::Integer(i) => *i as f64,
        RawValue::Real(f) => *f,
        RawValue::Text(t) => {
            let t = t.trim();
            if t.is_empty() {
                0.0
            } else {
                t.parse::<f64>()
                    .map_err(|_| invalid("position", format!("not a number: {t:?}")))?
            }
        }
    };
    if !p.is_finite() || !(0.0..=MAX_AVERAGE_POSITION).contains(&p) {
        return Err(invalid("position", format!("out of range: {p}")));
    }
    Ok(p)
}

fn invalid(metric: &str, detail: String) -> StageError {
    StageError::transformation(STAGE, format!("{metric}: {detail}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(demand: RawValue, impressions: RawValue, clicks: RawValue, position: RawValue) -> RawRow {
        RawRow {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            query: "rust sqlite".to_string(),
            page_path: "/blog/rusqlite".to_string(),
            device: "MOBILE".to_string(),
            demand,
            impressions,
            clicks,
            position,
        }
    }

    #[test]
    fn nulls_become_zero() {
        let d = reconcile_metrics(&row(RawValue::Null, RawValue::Null, RawValue::Null, RawValue::Null))
            .unwrap();
        assert_eq!((d.demand, d.impressions, d.clicks), (0, 0, 0));
        assert_eq!(d.position, 0.0);
        assert_eq!(d.device, Device::Mobile);
    }

    #[test]
    fn demand_raised_and_clicks_capped() {
        let d = reconcile_metrics(&row(
            RawValue::Integer(3),
            RawValue::Integer(10),
            RawValue::Integer(12),
            RawValue::Real(4.2),
        ))
        .unwrap();
        assert_eq!(d.demand, 10);
        assert_eq!(d.impressions, 10);
        assert_eq!(d.clicks, 10);
        assert_eq!(d.position, 4.2);
    }

    #[test]
    fn consistent_metrics_untouched() {
        let d = reconcile_metrics(&row(
            RawValue::Integer(50),
            RawValue::Integer(10),
            RawValue::Integer(2),
            RawValue::Real(1.5),
        ))
        .unwrap();
        assert_eq!((d.demand, d.impressions, d.clicks), (50, 10, 2));
    }

    #[test]
    fn loose_types_are_coerced() {
        let d = reconcile_metrics(&row(
            RawValue::Text(" 40 ".into()),
            RawValue::Real(20.9),
            RawValue::Text("3.0".into()),
            RawValue::Text("2.5".into()),
        ))
        .unwrap();
        assert_eq!((d.demand, d.impressions, d.clicks), (40, 20, 3));
        assert_eq!(d.position, 2.5);
    }

    #[test]
    fn garbage_is_a_transformation_error() {
        let err = reconcile_metrics(&row(
            RawValue::Text("lots".into()),
            RawValue::Null,
            RawValue::Null,
            RawValue::Null,
        ))
        .unwrap_err();
        assert!(matches!(err, StageError::Transformation { stage: "aggregated", .. }));
    }

    #[test]
    fn negative_count_rejected() {
        let err = reconcile_metrics(&row(
            RawValue::Null,
            RawValue::Integer(-1),
            RawValue::Null,
            RawValue::Null,
        ))
        .unwrap_err();
        assert!(err.to_string().contains("impressions"));
    }

    #[test]
    fn non_finite_position_rejected() {
        assert!(reconcile_metrics(&row(
            RawValue::Null,
            RawValue::Null,
            RawValue::Null,
            RawValue::Real(f64::NAN),
        ))
        .is_err());
    }

    #[test]
    fn unrankable_position_rejected() {
        let deep = row(RawValue::Null, RawValue::Null, RawValue::Null, RawValue::Real(2_000_000.0));
        assert_eq!(reconcile_metrics(&deep).unwrap().position, 2_000_000.0);

        let err = reconcile_metrics(&row(
            RawValue::Null,
            RawValue::Null,
            RawValue::Null,
            RawValue::Real(1e12),
        ))
        .unwrap_err();
        assert!(err.to_string().contains("position: out of range"), "{err}");
    }

    #[test]
    fn unknown_device_rejected() {
        let mut r = row(RawValue::Null, RawValue::Null, RawValue::Null, RawValue::Null);
        r.device = "WATCH".into();
        assert!(reconcile_metrics(&r).is_err());
    }
}
