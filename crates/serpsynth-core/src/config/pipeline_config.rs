//! Pipeline configuration.

use serde::{Deserialize, Serialize};

pub const DEFAULT_BATCH_SIZE: usize = 500;
pub const DEFAULT_DAYS_BACK: u32 = 20;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    /// Source rows per committed transaction in the generator stages. Default: 500.
    pub batch_size: Option<usize>,
    /// Lookback window in days for the raw loader. Default: 20.
    pub days_back: Option<u32>,
    /// Fixed RNG seed. Unset means seed from entropy.
    pub seed: Option<u64>,
}

impl PipelineConfig {
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE)
    }

    pub fn effective_days_back(&self) -> u32 {
        self.days_back.unwrap_or(DEFAULT_DAYS_BACK)
    }
}
