//! Interactive setup wizard for first-time configuration
//!
//! This module handles the interactive prompts for creating an initial
//! configuration when paramcache is run for the first time.

use super::ParamCacheConfig;
use config::ConfigError;
use dialoguer::{Input, theme::ColorfulTheme};
use std::path::PathBuf;

/// Interactive first-time setup - prompts for the store file and root path
///
/// 1. Prompts for the store file location (default: system data directory)
/// 2. Prompts for the path listings start from (default: `/`)
/// 3. Saves the configuration
///
/// # Errors
///
/// Returns `ConfigError` if user input cannot be read or the configuration
/// cannot be saved.
pub fn first_time_setup() -> Result<ParamCacheConfig, ConfigError> {
    println!("Welcome to paramcache! Let's set up your parameter store.\n");

    let mut config = ParamCacheConfig::default();

    let store: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Store location")
        .default(config.store.to_string_lossy().to_string())
        .interact_text()
        .map_err(|e| ConfigError::Message(format!("Failed to read input: {e}")))?;

    let root_path: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Root path")
        .default(config.sync.root_path.clone())
        .interact_text()
        .map_err(|e| ConfigError::Message(format!("Failed to read input: {e}")))?;

    config.store = PathBuf::from(store);
    config.sync.root_path = root_path;
    config.save()?;

    println!("\nConfiguration saved successfully!");
    Ok(config)
}
