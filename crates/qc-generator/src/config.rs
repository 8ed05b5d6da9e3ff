//! Configuration types for the block generator

use crate::error::{GeneratorError, Result};
use serde::Deserialize;
use std::time::Duration;

/// Runtime configuration for a generator instance
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Interval between production cycles of the scheduling loop (milliseconds)
    pub block_period_ms: u64,

    /// How long a single signer may take before its reply counts as absent (milliseconds)
    pub signer_timeout_ms: u64,

    /// Maximum transactions held in the pool awaiting inclusion
    pub max_pool_size: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            block_period_ms: crate::DEFAULT_BLOCK_PERIOD_MS,
            signer_timeout_ms: crate::DEFAULT_SIGNER_TIMEOUT_MS,
            max_pool_size: crate::DEFAULT_MAX_POOL_SIZE,
        }
    }
}

impl GeneratorConfig {
    /// Block period as a `Duration`
    pub fn block_period(&self) -> Duration {
        Duration::from_millis(self.block_period_ms)
    }

    /// Per-signer timeout as a `Duration`
    pub fn signer_timeout(&self) -> Duration {
        Duration::from_millis(self.signer_timeout_ms)
    }

    /// Reject values that would stall or disable production
    pub fn validate(&self) -> Result<()> {
        if self.block_period_ms == 0 {
            return Err(GeneratorError::InvalidConfig(
                "block_period_ms must be greater than zero".into(),
            ));
        }
        if self.signer_timeout_ms == 0 {
            return Err(GeneratorError::InvalidConfig(
                "signer_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.max_pool_size == 0 {
            return Err(GeneratorError::InvalidConfig(
                "max_pool_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
