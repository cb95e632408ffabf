//! Upstream source configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::Device;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory of `<YYYY-MM-DD>.jsonl` exports. Default: `data/raw`.
    pub input_dir: Option<PathBuf>,
    /// Device categories fetched per date. Default: all of them.
    #[serde(default)]
    pub device_types: Vec<Device>,
}

impl SourceConfig {
    pub fn effective_input_dir(&self) -> PathBuf {
        self.input_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("data/raw"))
    }

    pub fn effective_device_types(&self) -> Vec<Device> {
        if self.device_types.is_empty() {
            Device::ALL.to_vec()
        } else {
            self.device_types.clone()
        }
    }
}
