//! Upstream data-source errors.

use super::error_code::{self, SynthErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("malformed record at {path}:{line}: {message}")]
    Malformed {
        path: String,
        line: usize,
        message: String,
    },

    #[error("source unavailable: {message}")]
    Unavailable { message: String },
}

impl SynthErrorCode for SourceError {
    fn error_code(&self) -> &'static str {
        error_code::SOURCE_ERROR
    }
}
