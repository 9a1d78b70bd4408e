//! Scan configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::prelude::*;

/// Chunk size used when none is configured.
pub const DEFAULT_BLOCK_SIZE: usize = 256;

/// Execution substrate selection.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Backend {
    /// Use the GPU when one is available, otherwise fall back to the CPU.
    #[default]
    Auto,
    /// Require a GPU; a missing adapter is an error.
    Gpu,
    /// Rayon thread pool.
    Cpu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Elements per chunk (work-group size). Power of two, at least 2.
    pub block_size: usize,
    pub backend: Backend,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            backend: Backend::Auto,
        }
    }
}

impl ScanConfig {
    pub fn new(block_size: usize, backend: Backend) -> Self {
        Self {
            block_size,
            backend,
        }
    }

    /// Loads a YAML config. Missing fields take their defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: ScanConfig = serde_yml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_block_size(self.block_size)
    }
}

/// Checks the device-independent block size requirements.
///
/// The tree scan needs a power of two, and a block size of 1 would never
/// shrink the chunk-totals sequence.
pub fn validate_block_size(block_size: usize) -> Result<()> {
    if block_size < 2 {
        return Err(ScanError::InvalidBlockSize {
            block_size,
            reason: "must be at least 2".to_string(),
        });
    }
    if !block_size.is_power_of_two() {
        return Err(ScanError::InvalidBlockSize {
            block_size,
            reason: "must be a power of two".to_string(),
        });
    }
    Ok(())
}
