//! V002: pipeline run log.

pub const MIGRATION_SQL: &str = r#"
-- Append-only log of coordinator runs.
CREATE TABLE IF NOT EXISTS pipeline_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at INTEGER NOT NULL,
    completed_at INTEGER,
    duration_ms INTEGER,
    status TEXT NOT NULL DEFAULT 'running',
    error TEXT
) STRICT;

CREATE INDEX IF NOT EXISTS idx_pipeline_runs_time
    ON pipeline_runs(started_at DESC);

-- Rows written per stage, in execution order.
CREATE TABLE IF NOT EXISTS pipeline_run_stages (
    run_id INTEGER NOT NULL REFERENCES pipeline_runs(id),
    seq INTEGER NOT NULL,
    stage TEXT NOT NULL,
    rows_written INTEGER NOT NULL,
    PRIMARY KEY (run_id, seq)
) STRICT;
"#;
