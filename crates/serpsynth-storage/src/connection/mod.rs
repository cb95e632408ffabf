//! Connection management: one serialized connection per process.
//!
//! The pipeline runs single-threaded, so reads and writes share the same
//! connection; the mutex only guards against accidental cross-thread use.

pub mod pragmas;
pub mod writer;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::Connection;
use serpsynth_core::errors::StorageError;

use self::pragmas::apply_pragmas;
use crate::{migrations, to_storage_err};

/// Owns the store connection and the schema lifecycle.
pub struct DatabaseManager {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl DatabaseManager {
    /// Open a database at the given path, apply pragmas, run migrations.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(to_storage_err)?;
        apply_pragmas(&conn)?;
        migrations::run_migrations(&conn)?;
        tracing::debug!(path = %path.display(), "opened database");

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(to_storage_err)?;
        apply_pragmas(&conn)?;
        migrations::run_migrations(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Execute an operation with the connection, outside any explicit transaction.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|_| StorageError::sqlite("connection lock poisoned"))?;
        f(&guard)
    }

    /// Execute a write operation inside a `BEGIN IMMEDIATE` transaction.
    /// Commits when `f` succeeds, rolls back when it fails.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T, StorageError>,
    {
        self.with_conn(|conn| writer::with_immediate_transaction(conn, f))
    }

    /// Run a WAL checkpoint (TRUNCATE mode) after a pipeline run.
    pub fn checkpoint(&self) -> Result<(), StorageError> {
        self.with_conn(|conn| {
            conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
                .map_err(to_storage_err)
        })
    }

    /// Get the database file path (None for in-memory).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
