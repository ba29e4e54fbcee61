//! Application settings management
//!
//! Defines the configuration structure and provides methods for loading
//! settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main configuration structure for the synchronization core
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

/// Backing-store tuning knobs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Chunk size for batched identity lookups. The backing membership query
    /// accepts at most 10 keys per call, so values above that are rejected
    /// by validation.
    pub lookup_batch_size: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for rolling log files; stdout-only when unset.
    pub file_path: Option<String>,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("SYNCLINE"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::SyncError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                lookup_batch_size: 10,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
            },
        }
    }
}
