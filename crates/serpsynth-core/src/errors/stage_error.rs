//! Per-stage failures: extraction, transformation, load.

use super::error_code::{self, SynthErrorCode};
use super::StorageError;

/// A stage aborted. Each variant names the stage that failed.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("{stage}: extraction failed: {source}")]
    Extraction {
        stage: &'static str,
        #[source]
        source: StorageError,
    },

    #[error("{stage}: transformation failed: {message}")]
    Transformation { stage: &'static str, message: String },

    #[error("{stage}: load failed: {source}")]
    Load {
        stage: &'static str,
        #[source]
        source: StorageError,
    },
}

impl StageError {
    pub fn extraction(stage: &'static str) -> impl FnOnce(StorageError) -> Self {
        move |source| Self::Extraction { stage, source }
    }

    pub fn load(stage: &'static str) -> impl FnOnce(StorageError) -> Self {
        move |source| Self::Load { stage, source }
    }

    pub fn transformation(stage: &'static str, message: impl Into<String>) -> Self {
        Self::Transformation {
            stage,
            message: message.into(),
        }
    }

    /// Name of the stage that produced this error.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Extraction { stage, .. }
            | Self::Transformation { stage, .. }
            | Self::Load { stage, .. } => stage,
        }
    }
}

impl SynthErrorCode for StageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Extraction { .. } => error_code::EXTRACTION_ERROR,
            Self::Transformation { .. } => error_code::TRANSFORMATION_ERROR,
            Self::Load { .. } => error_code::LOAD_ERROR,
        }
    }
}
