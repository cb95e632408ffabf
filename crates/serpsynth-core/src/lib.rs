//! serpsynth-core: shared foundation for the serpsynth pipeline.
//!
//! - Types: raw, aggregated, position and click records
//! - Errors: one enum per subsystem, `thiserror` only
//! - Config: TOML-based layered configuration
//! - Tracing: `tracing-subscriber` setup with `EnvFilter`

pub mod config;
pub mod errors;
pub mod tracing;
pub mod types;

pub use config::SynthConfig;
pub use errors::{
    ConfigError, PipelineError, SourceError, StageError, StorageError, SynthErrorCode,
};
pub use types::{
    AggregatedRecord, ClickSample, Device, PositionSample, RawRow, RawValue,
    SourceRecord,
};
