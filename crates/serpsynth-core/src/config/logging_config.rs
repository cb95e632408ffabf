//! Logging configuration.

use serde::{Deserialize, Serialize};

pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error`. Default: `info`.
    pub level: Option<String>,
}

impl LoggingConfig {
    pub fn effective_level(&self) -> String {
        self.level
            .as_deref()
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "info".to_string())
    }
}
