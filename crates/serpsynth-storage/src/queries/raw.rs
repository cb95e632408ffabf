//! Queries for raw_search_metrics — upstream facts awaiting aggregation.

use chrono::NaiveDate;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, Row};
use serpsynth_core::errors::StorageError;
use serpsynth_core::types::{RawRow, RawValue, SourceRecord};

use crate::to_storage_err;

/// Insert one upstream record, skipping it when its natural key already
/// exists. Returns true when a row was written.
pub fn insert_ignore(conn: &Connection, record: &SourceRecord) -> Result<bool, StorageError> {
    let changed = conn
        .prepare_cached(
            "INSERT OR IGNORE INTO raw_search_metrics
                (date, query, page_path, device, demand, impressions, clicks, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .and_then(|mut stmt| {
            stmt.execute(params![
                record.date,
                record.query,
                record.page_path,
                record.device.as_str(),
                record.demand,
                record.impressions,
                record.clicks,
                record.position,
            ])
        })
        .map_err(to_storage_err)?;
    Ok(changed == 1)
}

/// Distinct dates present in `[from, to]`, ascending.
pub fn dates_in_range(
    conn: &Connection,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<NaiveDate>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT DISTINCT date FROM raw_search_metrics
             WHERE date BETWEEN ?1 AND ?2 ORDER BY date",
        )
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params![from, to], |row| row.get(0))
        .map_err(to_storage_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
}

/// Raw rows not yet aggregated relative to `watermark`: everything after it,
/// plus rows on the watermark date whose natural key is missing from
/// aggregated_metrics (a partially loaded boundary day). `None` (empty
/// aggregated table) selects every raw row.
/// Ordered by natural key so id assignment is deterministic.
pub fn select_since_watermark(
    conn: &Connection,
    watermark: Option<NaiveDate>,
) -> Result<Vec<RawRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT r.date, r.query, r.page_path, UPPER(TRIM(r.device)),
                    r.demand, r.impressions, r.clicks, r.position
             FROM raw_search_metrics r
             WHERE ?1 IS NULL
                OR r.date > ?1
                OR (r.date = ?1 AND NOT EXISTS (
                    SELECT 1 FROM aggregated_metrics a
                    WHERE a.date = r.date
                      AND a.query = r.query
                      AND a.page_path = r.page_path
                      AND a.device = UPPER(TRIM(r.device))
                ))
             ORDER BY r.date, r.query, r.page_path, UPPER(TRIM(r.device))",
        )
        .map_err(to_storage_err)?;

    let rows = stmt
        .query_map(params![watermark], map_raw_row)
        .map_err(to_storage_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
}

/// Count total raw rows.
pub fn count(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM raw_search_metrics", [], |row| row.get(0))
        .map_err(to_storage_err)
}

fn map_raw_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        date: row.get(0)?,
        query: row.get(1)?,
        page_path: row.get(2)?,
        device: row.get(3)?,
        demand: raw_value(row.get_ref(4)?),
        impressions: raw_value(row.get_ref(5)?),
        clicks: raw_value(row.get_ref(6)?),
        position: raw_value(row.get_ref(7)?),
    })
}

fn raw_value(value: ValueRef<'_>) -> RawValue {
    match value {
        ValueRef::Null => RawValue::Null,
        ValueRef::Integer(i) => RawValue::Integer(i),
        ValueRef::Real(f) => RawValue::Real(f),
        ValueRef::Text(t) | ValueRef::Blob(t) => {
            RawValue::Text(String::from_utf8_lossy(t).into_owned())
        }
    }
}
