//! Configuration for the bridge runtime.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the wasmtime engine and per-instance limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Maximum guest memory in bytes
    pub max_memory: usize,

    /// Fuel budget per instance (None = unmetered)
    pub fuel_limit: Option<u64>,

    /// Cranelift optimization level (0-3)
    pub optimization_level: u8,

    /// Cache compiled modules to disk
    pub cache_path: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            max_memory: 64 * 1024 * 1024, // 64 MB
            fuel_limit: None,
            optimization_level: 2,
            cache_path: None,
        }
    }
}

impl BridgeConfig {
    /// Create a minimal config for maximum containment
    pub fn minimal() -> Self {
        Self {
            max_memory: 16 * 1024 * 1024, // 16 MB
            fuel_limit: Some(1_000_000_000), // 1B fuel units
            ..Default::default()
        }
    }

    /// Builder: set max memory
    pub fn max_memory(mut self, bytes: usize) -> Self {
        self.max_memory = bytes;
        self
    }

    /// Builder: set fuel limit
    pub fn fuel_limit(mut self, fuel: u64) -> Self {
        self.fuel_limit = Some(fuel);
        self
    }

    /// Builder: set optimization level
    pub fn optimize(mut self, level: u8) -> Self {
        self.optimization_level = level.min(3);
        self
    }

    /// Builder: set cache path
    pub fn cache(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }
}
