//! Queries for impression_clicks — one row per synthetic click.

use rusqlite::{params, Connection};
use serpsynth_core::errors::StorageError;
use serpsynth_core::types::ClickSample;

use crate::to_storage_err;

/// Insert a batch of clicks with a cached statement. Returns rows written.
pub fn insert_batch(conn: &Connection, clicks: &[ClickSample]) -> Result<usize, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO impression_clicks (id, click_position, impression_order)
             VALUES (?1, ?2, ?3)",
        )
        .map_err(to_storage_err)?;
    for click in clicks {
        stmt.execute(params![click.id, click.click_position, click.impression_order])
            .map_err(to_storage_err)?;
    }
    Ok(clicks.len())
}

/// Clicks of one aggregated row in insertion order.
pub fn for_id(conn: &Connection, id: i64) -> Result<Vec<ClickSample>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, click_position, impression_order
             FROM impression_clicks WHERE id = ?1
             ORDER BY click_seq",
        )
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params![id], |row| {
            Ok(ClickSample {
                id: row.get(0)?,
                click_position: row.get(1)?,
                impression_order: row.get(2)?,
            })
        })
        .map_err(to_storage_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
}

pub fn count(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM impression_clicks", [], |row| row.get(0))
        .map_err(to_storage_err)
}
