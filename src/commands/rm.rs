//! Rm and rmdir commands - delete parameters

use crate::{ParamCacheError, sync::SyncEngine, sync::SyncError};
use dialoguer::Confirm;

type Result<T> = std::result::Result<T, ParamCacheError>;

/// Delete a single parameter
///
/// # Errors
/// Returns an error if the path is not a leaf or the store refuses the delete
pub async fn execute(engine: &SyncEngine, path: &str, quiet: bool) -> Result<()> {
    engine.delete_parameter(path).await?;
    if !quiet {
        println!("Deleted {path}");
    }
    Ok(())
}

/// Delete a folder and everything below it, asking first unless `yes`
///
/// # Errors
/// Returns an error if the path is not a folder, confirmation fails, or some
/// parameters could not be deleted
pub async fn execute_folder(engine: &SyncEngine, path: &str, yes: bool, quiet: bool) -> Result<()> {
    let node = engine
        .find_node(path)
        .ok_or_else(|| SyncError::NotFound(path.to_string()))?;
    if !node.is_folder() {
        return Err(SyncError::Validation(format!("{} is not a folder", node.id)).into());
    }
    let count = node.leaf_count();

    if !yes && !confirm(&format!("Delete {} and {count} parameter(s) below it?", node.id))? {
        if !quiet {
            println!("Cancelled.");
        }
        return Ok(());
    }

    let summary = engine.delete_folder(path).await?;
    if !quiet {
        println!("Deleted {} ({} parameter(s))", summary.folder, summary.deleted);
    }
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| ParamCacheError::InvalidInput(format!("Confirmation failed: {e}")))
}
