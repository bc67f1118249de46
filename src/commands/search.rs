//! Search command - ranked search over the cached tree

use crate::{ParamCacheError, output, sync::SyncEngine};

type Result<T> = std::result::Result<T, ParamCacheError>;

/// Execute the search command
///
/// # Errors
/// Returns an error if JSON output fails
pub fn execute(
    engine: &SyncEngine,
    query: &str,
    json: bool,
    limit: Option<usize>,
    quiet: bool,
) -> Result<()> {
    let mut hits = engine.search(query);
    if let Some(limit) = limit {
        hits.truncate(limit);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        if !quiet {
            println!("No matches for '{query}'.");
        }
        return Ok(());
    }
    if !quiet {
        println!("Matches for '{query}':");
    }
    for hit in &hits {
        println!("{}", output::search_hit(hit, quiet));
    }
    Ok(())
}
