//! Connection, pragma, migration and transaction behaviour.

use rusqlite::params;
use serpsynth_core::errors::{StorageError, SynthErrorCode};
use serpsynth_storage::connection::pragmas::verify_wal_mode;
use serpsynth_storage::migrations::{current_version, run_migrations};
use serpsynth_storage::DatabaseManager;
use tempfile::TempDir;

#[test]
fn file_database_uses_wal_and_latest_schema() {
    let dir = TempDir::new().unwrap();
    let db = DatabaseManager::open(&dir.path().join("synth.db")).unwrap();

    db.with_conn(|conn| {
        assert!(verify_wal_mode(conn)?);
        assert_eq!(current_version(conn)?, 2);
        let fk: i64 = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1, "foreign_keys should be ON");
        Ok(())
    })
    .unwrap();
    assert!(db.path().is_some());
}

#[test]
fn migrations_are_idempotent() {
    let db = DatabaseManager::open_in_memory().unwrap();
    db.with_conn(|conn| {
        run_migrations(conn)?;
        run_migrations(conn)?;
        assert_eq!(current_version(conn)?, 2);
        Ok(())
    })
    .unwrap();
}

#[test]
fn reopening_preserves_data() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("synth.db");
    {
        let db = DatabaseManager::open(&path).unwrap();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO raw_search_metrics (date, query, page_path, device, impressions)
                 VALUES ('2024-03-01', 'q', '/p', 'DESKTOP', 3)",
                [],
            )
            .map_err(|e| StorageError::sqlite(e.to_string()))?;
            Ok(())
        })
        .unwrap();
        db.checkpoint().unwrap();
    }
    let db = DatabaseManager::open(&path).unwrap();
    let count = db
        .with_conn(serpsynth_storage::queries::raw::count)
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn failed_transaction_rolls_back() {
    let db = DatabaseManager::open_in_memory().unwrap();

    let result: Result<(), StorageError> = db.with_transaction(|tx| {
        tx.execute(
            "INSERT INTO raw_search_metrics (date, query, page_path, device)
             VALUES (?1, ?2, ?3, ?4)",
            params!["2024-03-01", "q", "/p", "MOBILE"],
        )
        .map_err(|e| StorageError::sqlite(e.to_string()))?;
        Err(StorageError::sqlite("forced failure"))
    });
    assert!(result.is_err());

    let count = db.with_conn(serpsynth_storage::queries::raw::count).unwrap();
    assert_eq!(count, 0, "insert must not survive the rollback");
}

#[test]
fn successful_transaction_commits() {
    let db = DatabaseManager::open_in_memory().unwrap();
    db.with_transaction(|tx| {
        tx.execute(
            "INSERT INTO raw_search_metrics (date, query, page_path, device)
             VALUES ('2024-03-01', 'q', '/p', 'TABLET')",
            [],
        )
        .map_err(|e| StorageError::sqlite(e.to_string()))?;
        Ok(())
    })
    .unwrap();
    let count = db.with_conn(serpsynth_storage::queries::raw::count).unwrap();
    assert_eq!(count, 1);
}

#[test]
fn aggregated_constraints_reject_broken_invariants() {
    let db = DatabaseManager::open_in_memory().unwrap();
    let err = db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO aggregated_metrics
                (id, date, query, page_path, device, demand, impressions, clicks, position)
             VALUES (1, '2024-03-01', 'q', '/p', 'DESKTOP', 5, 10, 2, 3.0)",
            [],
        )
        .map_err(|e| StorageError::sqlite(e.to_string()))
    });
    assert!(err.is_err(), "demand < impressions must be rejected");
}

#[test]
fn driver_failures_map_to_storage_error_code() {
    let interrupted = rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_INTERRUPT),
        None,
    );
    let err = serpsynth_storage::to_storage_err(interrupted);
    assert!(matches!(err, StorageError::SqliteError { .. }));
    assert_eq!(err.error_code(), "STORAGE_ERROR");
}
