//! Configuration module for paramcache
//!
//! Manages where the parameter store lives and how load cycles are tuned.
//! Configuration is stored in the user's config directory.

mod setup;

pub use setup::first_time_setup;

use crate::sync::SyncSettings;
use config::{Config, ConfigError, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Keys accepted by [`ParamCacheConfig::get`] and [`ParamCacheConfig::set`]
pub const KEYS: &[&str] = &[
    "store",
    "quiet",
    "sync.root_path",
    "sync.page_size",
    "sync.value_batch_size",
    "sync.max_in_flight",
];

/// Application configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ParamCacheConfig {
    /// JSON file holding the parameter store
    #[serde(default = "default_store")]
    pub store: PathBuf,

    /// Suppress informational output by default
    #[serde(default)]
    pub quiet: bool,

    /// Load cycle tuning
    #[serde(default)]
    pub sync: SyncSettings,
}

impl Default for ParamCacheConfig {
    fn default() -> Self {
        Self {
            store: default_store(),
            quiet: false,
            sync: SyncSettings::default(),
        }
    }
}

fn default_store() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("paramcache")
        .join("store.json")
}

impl ParamCacheConfig {
    /// Get the path to the config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Message("Could not determine config directory".to_string()))?;
        Ok(config_dir.join("paramcache").join("config.toml"))
    }

    /// Load configuration from file, creating default if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file cannot be read, parsed, created,
    /// or holds out-of-range sync settings.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file, creating it if missing
    ///
    /// # Errors
    ///
    /// See [`ParamCacheConfig::load`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let default_config = Self::default();
            default_config.save_to(path)?;
            return Ok(default_config);
        }

        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config directory cannot be created, the configuration
    /// cannot be serialized to TOML, or the file cannot be written.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific file
    ///
    /// # Errors
    ///
    /// See [`ParamCacheConfig::save`].
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Message(format!("Failed to create config directory: {e}")))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {e}")))?;

        fs::write(path, toml_string)
            .map_err(|e| ConfigError::Message(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Load configuration, running first-time setup if config doesn't exist
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if loading or creating the configuration fails.
    pub fn load_or_setup() -> Result<Self, ConfigError> {
        if Self::config_path()?.exists() {
            Self::load()
        } else {
            first_time_setup()
        }
    }

    /// Check the sync settings against the store's limits
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` naming the offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sync
            .validate()
            .map_err(|e| ConfigError::Message(format!("Invalid [sync] settings: {e}")))
    }

    /// Current value of a configuration key, rendered as text
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "store" => self.store.display().to_string(),
            "quiet" => self.quiet.to_string(),
            "sync.root_path" => self.sync.root_path.clone(),
            "sync.page_size" => self.sync.page_size.to_string(),
            "sync.value_batch_size" => self.sync.value_batch_size.to_string(),
            "sync.max_in_flight" => self.sync.max_in_flight.to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// Change a configuration key in memory
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` for an unknown key, a value that does not
    /// parse, or a value outside the allowed range.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut next = self.clone();
        match key {
            "store" => next.store = PathBuf::from(value),
            "quiet" => next.quiet = parse(key, value)?,
            "sync.root_path" => next.sync.root_path = value.to_string(),
            "sync.page_size" => next.sync.page_size = parse(key, value)?,
            "sync.value_batch_size" => next.sync.value_batch_size = parse(key, value)?,
            "sync.max_in_flight" => next.sync.max_in_flight = parse(key, value)?,
            _ => {
                return Err(ConfigError::Message(format!(
                    "Unknown configuration key: '{key}'. Available keys: {}",
                    KEYS.join(", ")
                )));
            }
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Message(format!("Invalid value for {key}: '{value}'")))
}
