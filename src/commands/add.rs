//! Add command - create a parameter

use crate::{ParamCacheError, sync::SyncEngine, tree::ParameterType};

type Result<T> = std::result::Result<T, ParamCacheError>;

/// Execute the add command
///
/// # Errors
/// Returns an error if the path is invalid or taken, or the store refuses the write
pub async fn execute(
    engine: &SyncEngine,
    path: &str,
    value: &str,
    param_type: ParameterType,
    quiet: bool,
) -> Result<()> {
    engine.add_parameter(path, value, param_type).await?;
    if !quiet {
        println!("Created {path} ({param_type})");
    }
    Ok(())
}
