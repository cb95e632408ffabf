//! Queries for impression_positions — one row per synthetic impression.

use rusqlite::{params, Connection};
use serpsynth_core::errors::StorageError;
use serpsynth_core::types::PositionSample;

use crate::to_storage_err;

/// Insert a batch of samples with a cached statement. Returns rows written.
pub fn insert_batch(conn: &Connection, samples: &[PositionSample]) -> Result<usize, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO impression_positions (id, impression_position, impression_order)
             VALUES (?1, ?2, ?3)",
        )
        .map_err(to_storage_err)?;
    for sample in samples {
        stmt.execute(params![
            sample.id,
            sample.impression_position,
            sample.impression_order
        ])
        .map_err(to_storage_err)?;
    }
    Ok(samples.len())
}

/// Samples of one aggregated row ordered by impression_order.
pub fn for_id(conn: &Connection, id: i64) -> Result<Vec<PositionSample>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, impression_position, impression_order
             FROM impression_positions WHERE id = ?1
             ORDER BY impression_order",
        )
        .map_err(to_storage_err)?;
    let rows = stmt
        .query_map(params![id], |row| {
            Ok(PositionSample {
                id: row.get(0)?,
                impression_position: row.get(1)?,
                impression_order: row.get(2)?,
            })
        })
        .map_err(to_storage_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)
}

pub fn count(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM impression_positions", [], |row| row.get(0))
        .map_err(to_storage_err)
}
