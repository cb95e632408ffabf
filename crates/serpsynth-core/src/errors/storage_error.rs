//! Storage-layer errors for SQLite operations.

use super::error_code::{self, SynthErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },
}

impl StorageError {
    /// Shorthand for wrapping a driver message.
    pub fn sqlite(message: impl Into<String>) -> Self {
        Self::SqliteError {
            message: message.into(),
        }
    }
}

impl SynthErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::SqliteError { .. } => error_code::STORAGE_ERROR,
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
        }
    }
}
