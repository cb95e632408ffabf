//! serpsynth-storage: SQLite persistence for the raw, aggregated, position
//! and click tables, plus the pipeline run log.

pub mod connection;
pub mod migrations;
pub mod queries;

pub use connection::DatabaseManager;

use serpsynth_core::errors::StorageError;

/// Map a driver error into a [`StorageError`].
pub fn to_storage_err(e: rusqlite::Error) -> StorageError {
    StorageError::sqlite(e.to_string())
}
