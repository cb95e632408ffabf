//! Queries for aggregated_metrics — canonical facts with stable ids.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serpsynth_core::errors::StorageError;
use serpsynth_core::types::AggregatedRecord;

use super::device_from_column;
use crate::to_storage_err;

/// An aggregated row that still needs position samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingPositions {
    pub id: i64,
    pub impressions: i64,
    pub position: f64,
}

/// An aggregated row that still needs click samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingClicks {
    pub id: i64,
    pub clicks: i64,
}

/// Latest date present, or None when the table is empty.
pub fn max_date(conn: &Connection) -> Result<Option<NaiveDate>, StorageError> {
    conn.query_row("SELECT MAX(date) FROM aggregated_metrics", [], |row| row.get(0))
        .map_err(to_storage_err)
}

/// Highest assigned id, 0 when empty.
pub fn max_id(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row(
        "SELECT COALESCE(MAX(id), 0) FROM aggregated_metrics",
        [],
        |row| row.get(0),
    )
    .map_err(to_storage_err)
}

pub fn insert(conn: &Connection, record: &AggregatedRecord) -> Result<(), StorageError> {
    conn.prepare_cached(
        "INSERT INTO aggregated_metrics
            (id, date, query, page_path, device, demand, impressions, clicks, position)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )
    .and_then(|mut stmt| {
        stmt.execute(params![
            record.id,
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
    Ok(())
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<AggregatedRecord>, StorageError> {
    conn.query_row(
        "SELECT id, date, query, page_path, device, demand, impressions, clicks, position
         FROM aggregated_metrics WHERE id = ?1",
        params![id],
        map_record,
    )
    .optional()
    .map_err(to_storage_err)
}

/// All aggregated rows ordered by id.
pub fn query_all(conn: &Connection) -> Result<Vec<AggregatedRecord>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, date, query, page_path, device, demand, impressions, clicks, position
             FROM aggregated_metrics ORDER BY id",
        )
        .map_err(to_storage_err)?;
    let rows = stmt.query_map([], map_record).map_err(to_storage_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
}

/// Rows with impressions that have no position sample yet (anti-join on id).
pub fn pending_positions(conn: &Connection) -> Result<Vec<PendingPositions>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT a.id, a.impressions, a.position
             FROM aggregated_metrics a
             WHERE a.impressions > 0
               AND NOT EXISTS (
                   SELECT 1 FROM impression_positions p WHERE p.id = a.id
               )
             ORDER BY a.id",
        )
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(PendingPositions {
                id: row.get(0)?,
                impressions: row.get(1)?,
                position: row.get(2)?,
            })
        })
        .map_err(to_storage_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
}

/// Rows with clicks that have no click sample yet (anti-join on id).
pub fn pending_clicks(conn: &Connection) -> Result<Vec<PendingClicks>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT a.id, a.clicks
             FROM aggregated_metrics a
             WHERE a.clicks > 0
               AND NOT EXISTS (
                   SELECT 1 FROM impression_clicks c WHERE c.id = a.id
               )
             ORDER BY a.id",
        )
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(PendingClicks {
                id: row.get(0)?,
                clicks: row.get(1)?,
            })
        })
        .map_err(to_storage_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
}

pub fn count(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM aggregated_metrics", [], |row| row.get(0))
        .map_err(to_storage_err)
}

fn map_record(row: &Row<'_>) -> rusqlite::Result<AggregatedRecord> {
    Ok(AggregatedRecord {
        id: row.get(0)?,
        date: row.get(1)?,
        query: row.get(2)?,
        page_path: row.get(3)?,
        device: device_from_column(4, row.get(4)?)?,
        demand: row.get(5)?,
        impressions: row.get(6)?,
        clicks: row.get(7)?,
        position: row.get(8)?,
    })
}
