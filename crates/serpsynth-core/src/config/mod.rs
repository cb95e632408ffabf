//! Configuration system for serpsynth.
//! TOML-based, 4-layer resolution: CLI > env > config file > defaults.

pub mod database_config;
pub mod logging_config;
pub mod pipeline_config;
pub mod source_config;
pub mod synth_config;

pub use database_config::DatabaseConfig;
pub use logging_config::LoggingConfig;
pub use pipeline_config::PipelineConfig;
pub use source_config::SourceConfig;
pub use synth_config::{CliOverrides, SynthConfig};
