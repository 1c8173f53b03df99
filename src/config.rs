//! Engine and session settings. Every field has a default, so an empty
//! JSON object (or no file at all) yields the stock behavior.

use crate::compute::DEFAULT_SWEEPS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Relaxation sweeps per propagation call.
    pub sweeps: usize,
    /// Canvas snap grid spacing.
    pub grid_size: f64,
    /// Pointer distance within which a node counts as hit.
    pub hit_radius: f64,
    /// Pointer distance within which a connection counts as hit.
    pub pick_distance: f64,
    pub storage_slot: String,
    pub export_file_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sweeps: DEFAULT_SWEEPS,
            grid_size: 40.0,
            hit_radius: 20.0,
            pick_distance: 5.0,
            storage_slot: "ads_logic_save".to_string(),
            export_file_name: "ads_network.json".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sweeps == 0 {
            return Err(ConfigError::Invalid("sweeps must be at least 1".into()));
        }
        for (name, v) in [
            ("grid_size", self.grid_size),
            ("hit_radius", self.hit_radius),
            ("pick_distance", self.pick_distance),
        ] {
            if !(v.is_finite() && v > 0.0) {
                return Err(ConfigError::Invalid(format!("{} must be a positive number", name)));
            }
        }
        if self.storage_slot.is_empty() {
            return Err(ConfigError::Invalid("storage_slot must not be empty".into()));
        }
        Ok(())
    }
}
