/// Pipeline configuration, loaded from JSON
use crate::error::{PipelineError, Result};
use blobtrack::TrackerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Engine parameters; unspecified fields keep their defaults
    pub tracker: TrackerConfig,
    /// Write the track log in its compact form
    pub compress_log: bool,
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config
            .tracker
            .validate()
            .map_err(|e| PipelineError::config(e.to_string()))?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading pipeline configuration from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
