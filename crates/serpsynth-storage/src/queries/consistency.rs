//! Read-only cross-table checks. Each returns an anomaly count; zero means
//! the tables agree.

use rusqlite::Connection;
use serpsynth_core::errors::StorageError;

use crate::to_storage_err;

/// Aggregated rows with impressions but no position sample.
pub fn count_rows_missing_positions(conn: &Connection) -> Result<i64, StorageError> {
    count(
        conn,
        "SELECT COUNT(*) FROM aggregated_metrics a
         WHERE a.impressions > 0
           AND NOT EXISTS (SELECT 1 FROM impression_positions p WHERE p.id = a.id)",
    )
}

/// Clicks whose (id, impression_order) has no matching position sample.
pub fn count_orphaned_clicks(conn: &Connection) -> Result<i64, StorageError> {
    count(
        conn,
        "SELECT COUNT(*) FROM impression_clicks c
         WHERE NOT EXISTS (
             SELECT 1 FROM impression_positions p
             WHERE p.id = c.id AND p.impression_order = c.impression_order
         )",
    )
}

/// Ids with position samples whose sample count differs from impressions.
pub fn count_position_count_mismatch(conn: &Connection) -> Result<i64, StorageError> {
    count(
        conn,
        "SELECT COUNT(*) FROM (
             SELECT p.id FROM impression_positions p
             JOIN aggregated_metrics a ON a.id = p.id
             GROUP BY p.id, a.impressions
             HAVING COUNT(*) <> a.impressions
                 OR MIN(p.impression_order) <> 1
                 OR MAX(p.impression_order) <> a.impressions
         )",
    )
}

/// Ids with click samples whose sample count differs from clicks.
pub fn count_click_count_mismatch(conn: &Connection) -> Result<i64, StorageError> {
    count(
        conn,
        "SELECT COUNT(*) FROM (
             SELECT c.id FROM impression_clicks c
             JOIN aggregated_metrics a ON a.id = c.id
             GROUP BY c.id, a.clicks
             HAVING COUNT(*) <> a.clicks
         )",
    )
}

fn count(conn: &Connection, sql: &str) -> Result<i64, StorageError> {
    conn.query_row(sql, [], |row| row.get(0))
        .map_err(to_storage_err)
}
