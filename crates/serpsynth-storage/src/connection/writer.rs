//! Write transactions: BEGIN IMMEDIATE, commit on success.

use rusqlite::{Connection, Transaction, TransactionBehavior};
use serpsynth_core::errors::StorageError;

use crate::to_storage_err;

/// Execute a write operation inside a BEGIN IMMEDIATE transaction.
/// The write lock is taken at transaction start, so a concurrent writer
/// surfaces as `SQLITE_BUSY` here rather than halfway through `f`.
/// The transaction rolls back when `f` fails (on drop).
pub fn with_immediate_transaction<F, T>(conn: &Connection, f: F) -> Result<T, StorageError>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, StorageError>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate).map_err(|e| {
        StorageError::sqlite(format!("failed to begin immediate transaction: {e}"))
    })?;

    let result = f(&tx)?;

    tx.commit().map_err(to_storage_err)?;

    Ok(result)
}
