//! Queries for pipeline_runs — append-only log of coordinator runs.

use rusqlite::{params, Connection};
use serpsynth_core::errors::StorageError;

use crate::to_storage_err;

/// A pipeline run record with its per-stage counts.
#[derive(Debug, Clone)]
pub struct PipelineRunRow {
    pub id: i64,
    pub started_at: i64,
    pub completed_at: Option<i64>,
    pub duration_ms: Option<i64>,
    pub status: String,
    pub error: Option<String>,
    pub stages: Vec<(String, i64)>,
}

/// Insert a new run record (status = 'running'). Returns the row id.
pub fn insert_run_start(conn: &Connection, started_at: i64) -> Result<i64, StorageError> {
    conn.execute(
        "INSERT INTO pipeline_runs (started_at, status) VALUES (?1, 'running')",
        params![started_at],
    )
    .map_err(to_storage_err)?;
    Ok(conn.last_insert_rowid())
}

/// Record the rows written by one stage of a run.
pub fn insert_stage_count(
    conn: &Connection,
    run_id: i64,
    seq: usize,
    stage: &str,
    rows_written: usize,
) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO pipeline_run_stages (run_id, seq, stage, rows_written)
         VALUES (?1, ?2, ?3, ?4)",
        params![run_id, seq as i64, stage, rows_written as i64],
    )
    .map_err(to_storage_err)?;
    Ok(())
}

/// Close a run record with its outcome.
pub fn update_run_complete(
    conn: &Connection,
    id: i64,
    completed_at: i64,
    duration_ms: i64,
    status: &str,
    error: Option<&str>,
) -> Result<(), StorageError> {
    conn.execute(
        "UPDATE pipeline_runs SET
            completed_at = ?1, duration_ms = ?2, status = ?3, error = ?4
         WHERE id = ?5",
        params![completed_at, duration_ms, status, error, id],
    )
    .map_err(to_storage_err)?;
    Ok(())
}

/// Most recent runs first.
pub fn query_recent(conn: &Connection, limit: usize) -> Result<Vec<PipelineRunRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, started_at, completed_at, duration_ms, status, error
             FROM pipeline_runs ORDER BY started_at DESC, id DESC LIMIT ?1",
        )
        .map_err(to_storage_err)?;

    let rows = stmt
        .query_map(params![limit as i64], |row| {
            Ok(PipelineRunRow {
                id: row.get(0)?,
                started_at: row.get(1)?,
                completed_at: row.get(2)?,
                duration_ms: row.get(3)?,
                status: row.get(4)?,
                error: row.get(5)?,
                stages: Vec::new(),
            })
        })
        .map_err(to_storage_err)?;
    let mut runs = rows.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)?;

    let mut stage_stmt = conn
        .prepare_cached(
            "SELECT stage, rows_written FROM pipeline_run_stages
             WHERE run_id = ?1 ORDER BY seq",
        )
        .map_err(to_storage_err)?;
    for run in &mut runs {
        let stages = stage_stmt
            .query_map(params![run.id], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(to_storage_err)?;
        run.stages = stages.collect::<Result<Vec<_>, _>>().map_err(to_storage_err)?;
    }

    Ok(runs)
}

/// Count total runs.
pub fn count(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM pipeline_runs", [], |row| row.get(0))
        .map_err(to_storage_err)
}
