//! V001: Initial schema.
//! raw_search_metrics, aggregated_metrics, impression_positions, impression_clicks.

pub const MIGRATION_SQL: &str = r#"
-- Upstream facts as delivered. Deliberately not STRICT: metric cells may be
-- NULL or loosely typed and are coerced by the aggregation stage.
CREATE TABLE IF NOT EXISTS raw_search_metrics (
    date TEXT NOT NULL,
    query TEXT NOT NULL,
    page_path TEXT NOT NULL,
    device TEXT NOT NULL,
    demand INTEGER,
    impressions INTEGER,
    clicks INTEGER,
    position REAL,
    ingested_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE(date, query, page_path, device)
);

CREATE INDEX IF NOT EXISTS idx_raw_search_metrics_date
    ON raw_search_metrics(date);

-- Canonical aggregated facts. ids are assigned by the aggregation stage in
-- natural-key order and never reused.
CREATE TABLE IF NOT EXISTS aggregated_metrics (
    id INTEGER PRIMARY KEY,
    date TEXT NOT NULL,
    query TEXT NOT NULL,
    page_path TEXT NOT NULL,
    device TEXT NOT NULL CHECK (device IN ('DESKTOP', 'MOBILE', 'TABLET')),
    demand INTEGER NOT NULL CHECK (demand >= impressions),
    impressions INTEGER NOT NULL CHECK (impressions >= 0),
    clicks INTEGER NOT NULL CHECK (clicks >= 0 AND clicks <= impressions),
    position REAL NOT NULL CHECK (position >= 0),
    UNIQUE(date, query, page_path, device)
) STRICT;

CREATE INDEX IF NOT EXISTS idx_aggregated_metrics_date
    ON aggregated_metrics(date);

-- One row per synthetic impression; impression_order is dense 1..impressions.
CREATE TABLE IF NOT EXISTS impression_positions (
    id INTEGER NOT NULL REFERENCES aggregated_metrics(id),
    impression_position INTEGER NOT NULL CHECK (impression_position >= 1),
    impression_order INTEGER NOT NULL CHECK (impression_order >= 1),
    PRIMARY KEY (id, impression_order)
) STRICT, WITHOUT ROWID;

-- One row per synthetic click. click_seq is a surrogate key because
-- overflow sampling may attribute several clicks to one impression.
CREATE TABLE IF NOT EXISTS impression_clicks (
    click_seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id INTEGER NOT NULL,
    click_position INTEGER NOT NULL CHECK (click_position >= 1),
    impression_order INTEGER NOT NULL,
    FOREIGN KEY (id, impression_order)
        REFERENCES impression_positions(id, impression_order)
) STRICT;

CREATE INDEX IF NOT EXISTS idx_impression_clicks_id
    ON impression_clicks(id, impression_order);
"#;
