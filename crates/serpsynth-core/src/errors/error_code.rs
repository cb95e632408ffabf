//! SynthErrorCode trait for stable, greppable error codes.

/// Every error enum implements this to expose a structured code string
/// alongside its human-readable message.
pub trait SynthErrorCode {
    /// Returns the error code string (e.g., "EXTRACTION_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the tagged error string: `[ERROR_CODE] message`.
    fn tagged(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const SOURCE_ERROR: &str = "SOURCE_ERROR";
pub const EXTRACTION_ERROR: &str = "EXTRACTION_ERROR";
pub const TRANSFORMATION_ERROR: &str = "TRANSFORMATION_ERROR";
pub const LOAD_ERROR: &str = "LOAD_ERROR";
