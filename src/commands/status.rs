//! Status command - report the load cycle

use crate::{ParamCacheError, output, sync::SyncEngine};

type Result<T> = std::result::Result<T, ParamCacheError>;

/// Execute the status command
///
/// # Errors
/// Returns an error if JSON output fails
pub fn execute(engine: &SyncEngine, json: bool) -> Result<()> {
    let status = engine.status();
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let snapshot = engine.snapshot();
    println!(
        "Parameters:   {} in {} folder(s)",
        snapshot.leaf_count(),
        snapshot.folder_count()
    );
    let dirty = snapshot.leaves().iter().filter(|n| n.is_dirty).count();
    if dirty > 0 {
        println!("Unsaved:      {dirty}");
    }
    for line in output::status_lines(&status) {
        println!("{line}");
    }
    Ok(())
}
