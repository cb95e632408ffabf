//! Store connection configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file. Default: `serpsynth.db`.
    pub path: Option<PathBuf>,
}

impl DatabaseConfig {
    pub fn effective_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from("serpsynth.db"))
    }
}
