//! Top-level pipeline errors.

use super::error_code::SynthErrorCode;
use super::{ConfigError, SourceError, StageError, StorageError};

/// Errors that terminate a pipeline run.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Stage error: {0}")]
    Stage(#[from] StageError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl SynthErrorCode for PipelineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Stage(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Source(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
        }
    }
}
