//! Config command - read and change configuration

use crate::{ParamCacheError, cli::ConfigCommands, config::ParamCacheConfig};

type Result<T> = std::result::Result<T, ParamCacheError>;

/// Execute the config command
///
/// # Errors
/// Returns an error for a malformed setting, an unknown key, or a failed save
pub fn execute(config: &mut ParamCacheConfig, command: &ConfigCommands, quiet: bool) -> Result<()> {
    match command {
        ConfigCommands::Set { setting } => {
            let (key, value) = setting.split_once('=').ok_or_else(|| {
                ParamCacheError::InvalidInput(
                    "Invalid format. Use: paramcache config set key=value".into(),
                )
            })?;
            let (key, value) = (key.trim(), value.trim());
            config.set(key, value)?;
            config.save()?;
            if !quiet {
                println!("Set {key} = {value}");
            }
        }
        ConfigCommands::Get { key } => {
            let value = config.get(key).ok_or_else(|| {
                ParamCacheError::InvalidInput(format!(
                    "Unknown configuration key: '{key}'. Available keys: {}",
                    crate::config::KEYS.join(", ")
                ))
            })?;
            println!("{value}");
        }
        ConfigCommands::Path => {
            println!("{}", ParamCacheConfig::config_path()?.display());
        }
    }
    Ok(())
}
