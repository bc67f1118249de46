//! Get command - print a parameter

use crate::{
    ParamCacheError, output,
    sync::{SyncEngine, SyncError},
    tree::Node,
};

type Result<T> = std::result::Result<T, ParamCacheError>;

/// Execute the get command
///
/// # Errors
/// Returns an error if the path is unknown, is a folder, or JSON output fails
pub fn execute(engine: &SyncEngine, path: &str, json: bool, reveal: bool) -> Result<()> {
    let node = engine
        .find_node(path)
        .ok_or_else(|| SyncError::NotFound(path.to_string()))?;
    if node.is_folder() {
        return Err(SyncError::Validation(format!("{} is a folder", node.id)).into());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&masked(node, reveal))?);
        return Ok(());
    }

    match output::leaf_value(&node, reveal) {
        Some(value) => println!("{value}"),
        None => {
            return Err(ParamCacheError::InvalidInput(format!(
                "{} has no loaded value",
                node.id
            )));
        }
    }
    Ok(())
}

fn masked(mut node: Node, reveal: bool) -> Node {
    if !reveal && node.param_type.is_some_and(|t| t.is_secure()) {
        let mask = |v: &mut Option<String>| {
            if v.is_some() {
                *v = Some(output::MASK.to_string());
            }
        };
        mask(&mut node.value);
        mask(&mut node.server_value);
    }
    node
}
