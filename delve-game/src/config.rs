//! Engine configuration: map shape, advisory buffer and storage keys.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    COLLECTIONS_KEY, DEFAULT_MAX_DEPTH, DEFAULT_NODES_PER_DEPTH, DEFAULT_SAFETY_BUFFER,
    MAX_CONFIG_DEPTH, MAX_NODES_PER_DEPTH, PROGRESSION_KEY, RUN_QUEUE_KEY,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} must be between {min} and {max} (got {value})")]
    RangeViolation {
        field: &'static str,
        min: u32,
        max: u32,
        value: u32,
    },
    #[error("storage key {field} is empty")]
    EmptyKey { field: &'static str },
    #[error("storage key {key:?} is used more than once")]
    DuplicateKey { key: String },
    #[error("config is not valid JSON: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageKeys {
    #[serde(default = "StorageKeys::default_run_queue")]
    pub run_queue: String,
    #[serde(default = "StorageKeys::default_progression")]
    pub progression: String,
    #[serde(default = "StorageKeys::default_collections")]
    pub collections: String,
}

impl StorageKeys {
    fn default_run_queue() -> String {
        RUN_QUEUE_KEY.to_string()
    }

    fn default_progression() -> String {
        PROGRESSION_KEY.to_string()
    }

    fn default_collections() -> String {
        COLLECTIONS_KEY.to_string()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let keys = [
            ("storage_keys.run_queue", &self.run_queue),
            ("storage_keys.progression", &self.progression),
            ("storage_keys.collections", &self.collections),
        ];
        for (field, key) in keys {
            if key.trim().is_empty() {
                return Err(ConfigError::EmptyKey { field });
            }
        }
        for (idx, (_, key)) in keys.iter().enumerate() {
            if keys[idx + 1..].iter().any(|(_, other)| other == key) {
                return Err(ConfigError::DuplicateKey {
                    key: (*key).clone(),
                });
            }
        }
        Ok(())
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            run_queue: Self::default_run_queue(),
            progression: Self::default_progression(),
            collections: Self::default_collections(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "EngineConfig::default_max_depth")]
    pub max_depth: u32,
    #[serde(default = "EngineConfig::default_nodes_per_depth")]
    pub nodes_per_depth: u32,
    #[serde(default = "EngineConfig::default_safety_buffer")]
    pub safety_buffer: u32,
    #[serde(default)]
    pub storage_keys: StorageKeys,
}

impl EngineConfig {
    #[must_use]
    pub const fn default_max_depth() -> u32 {
        DEFAULT_MAX_DEPTH
    }

    #[must_use]
    pub const fn default_nodes_per_depth() -> u32 {
        DEFAULT_NODES_PER_DEPTH
    }

    #[must_use]
    pub const fn default_safety_buffer() -> u32 {
        DEFAULT_SAFETY_BUFFER
    }

    /// Parse and validate a config document. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// `ConfigError::Parse` for malformed JSON, otherwise whatever
    /// [`Self::validate`] reports.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates its bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_CONFIG_DEPTH).contains(&self.max_depth) {
            return Err(ConfigError::RangeViolation {
                field: "max_depth",
                min: 1,
                max: MAX_CONFIG_DEPTH,
                value: self.max_depth,
            });
        }
        if !(1..=MAX_NODES_PER_DEPTH).contains(&self.nodes_per_depth) {
            return Err(ConfigError::RangeViolation {
                field: "nodes_per_depth",
                min: 1,
                max: MAX_NODES_PER_DEPTH,
                value: self.nodes_per_depth,
            });
        }
        self.storage_keys.validate()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: Self::default_max_depth(),
            nodes_per_depth: Self::default_nodes_per_depth(),
            safety_buffer: Self::default_safety_buffer(),
            storage_keys: StorageKeys::default(),
        }
    }
}
