//! Tree command - show the parameter tree

use crate::{ParamCacheError, output, sync::SyncEngine, sync::SyncError, tree::path};

type Result<T> = std::result::Result<T, ParamCacheError>;

/// Execute the tree command
///
/// # Errors
/// Returns an error if `start` names a node that is not in the tree
pub fn execute(
    engine: &SyncEngine,
    start: Option<&str>,
    depth: Option<usize>,
    quiet: bool,
) -> Result<()> {
    let snapshot = engine.snapshot();
    let start = start.map(path::normalize).filter(|id| id != "/");
    let lines = match start {
        None => output::tree_lines(snapshot.roots(), depth, quiet),
        Some(id) => {
            let node = snapshot
                .find(&id)
                .ok_or_else(|| SyncError::NotFound(id.clone()))?;
            if node.is_folder() {
                output::tree_lines(node.children(), depth, quiet)
            } else {
                output::tree_lines(std::slice::from_ref(node), depth, quiet)
            }
        }
    };

    if lines.is_empty() {
        if !quiet {
            println!("No parameters found.");
        }
        return Ok(());
    }
    for line in lines {
        println!("{line}");
    }
    Ok(())
}
