//! Output formatting for CLI display
//!
//! This module renders tree nodes, search hits and the sync status for the
//! terminal. Quiet mode drops decoration so output can be piped.

use crate::search::{MatchKind, SearchHit};
use crate::sync::{LoadSummary, SyncStatus};
use crate::tree::{Node, ParameterType};
use colored::Colorize;

/// Shown instead of a secure string value
pub const MASK: &str = "********";

/// Value of a leaf as it should be printed
///
/// Secure strings are masked unless `reveal` is set.
#[must_use]
pub fn leaf_value(node: &Node, reveal: bool) -> Option<String> {
    let value = node.value.as_deref()?;
    if node.param_type == Some(ParameterType::SecureString) && !reveal {
        Some(MASK.to_string())
    } else {
        Some(value.to_string())
    }
}

/// Markers for a leaf's local state: `+` pending, `*` dirty, `?` not loaded
#[must_use]
pub fn state_marker(node: &Node) -> &'static str {
    if node.is_pending {
        "+"
    } else if node.is_dirty {
        "*"
    } else if !node.is_value_loaded {
        "?"
    } else {
        ""
    }
}

/// Render nodes as an indented tree, down to `depth` levels
#[must_use]
pub fn tree_lines(nodes: &[Node], depth: Option<usize>, quiet: bool) -> Vec<String> {
    fn visit(nodes: &[Node], level: usize, depth: Option<usize>, quiet: bool, out: &mut Vec<String>) {
        for node in nodes {
            out.push(node_line(node, level, quiet));
            if node.is_folder() && depth.is_none_or(|d| level + 1 < d) {
                visit(node.children(), level + 1, depth, quiet, out);
            }
        }
    }
    let mut out = Vec::new();
    visit(nodes, 0, depth, quiet, &mut out);
    out
}

fn node_line(node: &Node, level: usize, quiet: bool) -> String {
    if quiet {
        return node.id.clone();
    }
    let indent = "  ".repeat(level);
    if node.is_folder() {
        return format!("{indent}{}/", node.name.blue().bold());
    }
    let marker = state_marker(node);
    let value = leaf_value(node, false).unwrap_or_default();
    format!("{indent}{}{} = {}", node.name, marker.yellow(), value.dimmed())
}

/// Format a search hit for display
#[must_use]
pub fn search_hit(hit: &SearchHit, quiet: bool) -> String {
    if quiet {
        return hit.id.clone();
    }
    let id = if hit.is_folder {
        format!("{}/", hit.id).blue().bold().to_string()
    } else {
        hit.id.green().to_string()
    };
    match (&hit.kind, &hit.excerpt) {
        (MatchKind::Value, Some(excerpt)) => format!("  {id}  {}", excerpt.dimmed()),
        (kind, _) => format!("  {id}  ({kind})"),
    }
}

/// One-line summary of a load cycle
#[must_use]
pub fn load_summary(summary: &LoadSummary) -> String {
    let mut line = format!("Loaded {}/{} parameter(s)", summary.loaded, summary.total);
    if summary.pruned > 0 {
        line.push_str(&format!(", {} removed", summary.pruned));
    }
    if summary.failed_batches > 0 {
        line.push_str(&format!(
            ", {} batch(es) failed",
            summary.failed_batches
        ));
        return line.yellow().to_string();
    }
    line
}

/// Multi-line status report
#[must_use]
pub fn status_lines(status: &SyncStatus) -> Vec<String> {
    let mut lines = vec![
        format!("Phase:        {}", status.phase),
        format!(
            "Connected:    {}",
            if status.connected { "yes".green() } else { "no".red() }
        ),
        format!("Generation:   {}", status.generation),
    ];
    if let Some(progress) = status.progress {
        lines.push(format!("Progress:     {progress}"));
    }
    if let Some(at) = status.last_updated {
        lines.push(format!("Last updated: {}", at.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    if status.failed_batches > 0 {
        lines.push(format!("Failed:       {} batch(es)", status.failed_batches));
    }
    if let Some(error) = &status.last_error {
        lines.push(format!("Last error:   {}", error.red()));
    }
    lines
}
