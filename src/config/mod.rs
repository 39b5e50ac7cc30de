pub mod layout;
pub mod path;
pub mod sample;
pub mod store;


use std::{io, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mapping::profiler::ProfilerThresholds;

/// Represents all possible errors loading a configuration or mapping file
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Could not read: {0}")]
    IoError(#[from] io::Error),
    #[error("Unable to deserialize: {0}")]
    DeserializeError(#[from] serde_yaml::Error),
    #[error("Unable to deserialize JSON: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("File is empty")]
    Empty,
}

/// Tunables of the report decoder. Every field is optional in the YAML file
/// and falls back to its default.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct DecoderConfig {
    /// Number of recent raw reports kept for heuristic detection
    pub recent_capacity: usize,
    /// Minimum number of buffered reports before an unreachable axis is
    /// estimated from the most variable byte
    pub min_recent_for_estimate: usize,
    /// Axis changes at or below this value do not emit an event
    pub axis_noise_threshold: f64,
    pub profiler: ProfilerThresholds,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            recent_capacity: 8,
            min_recent_for_estimate: 3,
            axis_noise_threshold: 0.05,
            profiler: ProfilerThresholds::default(),
        }
    }
}

impl DecoderConfig {
    /// Load a [DecoderConfig] from the given YAML string
    pub fn from_yaml(content: String) -> Result<DecoderConfig, LoadError> {
        let config: DecoderConfig = serde_yaml::from_str(content.as_str())?;
        Ok(config)
    }

    /// Load a [DecoderConfig] from the given YAML file
    pub fn from_yaml_file<P>(path: P) -> Result<DecoderConfig, LoadError>
    where
        P: AsRef<Path>,
    {
        let file = std::fs::File::open(path)?;
        let config: DecoderConfig = serde_yaml::from_reader(file)?;
        Ok(config)
    }

    /// Load the decoder config from the given path if one was given, otherwise
    /// from the first config file found in the default locations. Falls back
    /// to the defaults if nothing can be loaded.
    pub fn load(path: Option<&Path>) -> DecoderConfig {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => self::path::find_decoder_config(),
        };
        let Some(path) = path else {
            log::debug!("No decoder config found. Using defaults.");
            return DecoderConfig::default();
        };

        match DecoderConfig::from_yaml_file(&path) {
            Ok(config) => {
                log::info!("Loaded decoder config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!(
                    "Failed to load decoder config {}: {e}. Using defaults.",
                    path.display()
                );
                DecoderConfig::default()
            }
        }
    }
}
