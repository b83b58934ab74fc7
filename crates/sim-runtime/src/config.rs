//! Host-level settings: seed, autosave cadence, save slot and balance.

use crate::error::RuntimeError;
use serde::{Deserialize, Serialize};
use sim_core::{Millis, Tuning};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Seed for every random roll in the session.
    pub rng_seed: u64,
    /// Minimum time between autosaves. Zero or less saves only after actions.
    pub autosave_interval_ms: Millis,
    pub save_slot: String,
    pub tuning: Tuning,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            rng_seed: 42,
            autosave_interval_ms: 30_000,
            save_slot: "main".to_string(),
            tuning: Tuning::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, RuntimeError> {
        serde_yaml::from_str(text).map_err(|e| RuntimeError::Config(e.to_string()))
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, RuntimeError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| RuntimeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_yaml_str(&text)
    }
}
