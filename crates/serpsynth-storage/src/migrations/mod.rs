//! Schema migrations using PRAGMA user_version.

pub mod v001_initial;
pub mod v002_pipeline_runs;

use rusqlite::Connection;
use serpsynth_core::errors::StorageError;

/// Run all pending migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), StorageError> {
    let current_version: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| StorageError::MigrationFailed {
            version: 0,
            message: e.to_string(),
        })?;

    let migrations: &[(&str, u32)] = &[
        (v001_initial::MIGRATION_SQL, 1),
        (v002_pipeline_runs::MIGRATION_SQL, 2),
    ];

    for (sql, version) in migrations {
        if current_version < *version {
            conn.execute_batch(sql)
                .map_err(|e| StorageError::MigrationFailed {
                    version: *version,
                    message: e.to_string(),
                })?;

            conn.pragma_update(None, "user_version", version)
                .map_err(|e| StorageError::MigrationFailed {
                    version: *version,
                    message: e.to_string(),
                })?;
            tracing::info!(version = version, "applied migration");
        }
    }

    Ok(())
}

/// Get the current schema version.
pub fn current_version(conn: &Connection) -> Result<u32, StorageError> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| StorageError::sqlite(e.to_string()))
}
