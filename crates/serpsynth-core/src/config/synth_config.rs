//! Top-level configuration with 4-layer resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::logging_config::LOG_LEVELS;
use super::{DatabaseConfig, LoggingConfig, PipelineConfig, SourceConfig};
use crate::errors::ConfigError;

/// File name looked up in the working directory when no explicit path is given.
pub const CONFIG_FILE_NAME: &str = "serpsynth.toml";

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`SERPSYNTH_*`)
/// 3. Config file (`--config` path, or `serpsynth.toml` in the root)
/// 4. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SynthConfig {
    pub database: DatabaseConfig,
    pub source: SourceConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl SynthConfig {
    /// Load configuration with layered resolution, reading `SERPSYNTH_*`
    /// variables from the process environment.
    pub fn load(root: &Path, cli: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        Self::load_with_env(root, cli, |key| std::env::var(key).ok())
    }

    /// Same as [`SynthConfig::load`] with an explicit environment lookup.
    pub fn load_with_env<F>(
        root: &Path,
        cli: Option<&CliOverrides>,
        env: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Layer 3: config file. An explicit path must exist.
        match cli.and_then(|c| c.config_path.as_deref()) {
            Some(path) => Self::merge_toml_file(&mut config, path)?,
            None => {
                let default_path = root.join(CONFIG_FILE_NAME);
                if default_path.exists() {
                    Self::merge_toml_file(&mut config, &default_path)?;
                }
            }
        }

        // Layer 2: environment variables
        Self::apply_env_overrides(&mut config, env)?;

        // Layer 1: CLI flags
        if let Some(cli) = cli {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &SynthConfig) -> Result<(), ConfigError> {
        if config.pipeline.batch_size == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "pipeline.batch_size".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.pipeline.days_back == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "pipeline.days_back".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        let level = config.logging.effective_level();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::ValidationFailed {
                field: "logging.level".to_string(),
                message: format!("must be one of {}", LOG_LEVELS.join(", ")),
            });
        }
        Ok(())
    }

    fn merge_toml_file(config: &mut SynthConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: SynthConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; `other` wins only where it has a value.
    fn merge(base: &mut SynthConfig, other: &SynthConfig) {
        if other.database.path.is_some() {
            base.database.path = other.database.path.clone();
        }

        if other.source.input_dir.is_some() {
            base.source.input_dir = other.source.input_dir.clone();
        }
        if !other.source.device_types.is_empty() {
            base.source.device_types = other.source.device_types.clone();
        }

        if other.pipeline.batch_size.is_some() {
            base.pipeline.batch_size = other.pipeline.batch_size;
        }
        if other.pipeline.days_back.is_some() {
            base.pipeline.days_back = other.pipeline.days_back;
        }
        if other.pipeline.seed.is_some() {
            base.pipeline.seed = other.pipeline.seed;
        }

        if other.logging.level.is_some() {
            base.logging.level = other.logging.level.clone();
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `SERPSYNTH_DB_PATH`, `SERPSYNTH_BATCH_SIZE`, etc.
    fn apply_env_overrides<F>(config: &mut SynthConfig, env: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = env("SERPSYNTH_DB_PATH") {
            config.database.path = Some(PathBuf::from(val));
        }
        if let Some(val) = env("SERPSYNTH_SOURCE_DIR") {
            config.source.input_dir = Some(PathBuf::from(val));
        }
        if let Some(val) = env("SERPSYNTH_BATCH_SIZE") {
            config.pipeline.batch_size = Some(parse_env("SERPSYNTH_BATCH_SIZE", &val)?);
        }
        if let Some(val) = env("SERPSYNTH_DAYS_BACK") {
            config.pipeline.days_back = Some(parse_env("SERPSYNTH_DAYS_BACK", &val)?);
        }
        if let Some(val) = env("SERPSYNTH_SEED") {
            config.pipeline.seed = Some(parse_env("SERPSYNTH_SEED", &val)?);
        }
        if let Some(val) = env("SERPSYNTH_LOG_LEVEL") {
            config.logging.level = Some(val);
        }
        Ok(())
    }

    fn apply_cli_overrides(config: &mut SynthConfig, cli: &CliOverrides) {
        if let Some(ref v) = cli.db_path {
            config.database.path = Some(v.clone());
        }
        if let Some(ref v) = cli.log_level {
            config.logging.level = Some(v.clone());
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, val: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    val.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::ValidationFailed {
            field: key.to_string(),
            message: e.to_string(),
        })
}
