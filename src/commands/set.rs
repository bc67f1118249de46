//! Set command - change a value and save it

use crate::{ParamCacheError, sync::SyncEngine};

type Result<T> = std::result::Result<T, ParamCacheError>;

/// Execute the set command
///
/// # Errors
/// Returns an error if the path is not a leaf or the store refuses the write
pub async fn execute(engine: &SyncEngine, path: &str, value: &str, quiet: bool) -> Result<()> {
    engine.edit_local_value(path, value)?;
    engine.save(path).await?;
    if !quiet {
        println!("Saved {path}");
    }
    Ok(())
}
