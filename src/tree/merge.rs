//! Reconcile an incoming snapshot into the existing tree
//!
//! Siblings are matched by id. Local state wins where it carries unsynced user
//! input:
//! - a dirty leaf keeps its value and is only un-dirtied once the confirmed
//!   value equals it
//! - a loaded value is never downgraded by a metadata-only snapshot
//! - pending nodes survive even when the snapshot does not list them
//! - a node that changed kind remotely is replaced, unless it is dirty or
//!   holds pending nodes
//!
//! Merging a tree with itself is a no-op, and merges touching disjoint leaves
//! commute.

use super::node::{Node, sort_recursive};
use std::collections::HashMap;

/// Merge `incoming` siblings into `existing` siblings
pub fn merge_into(existing: &mut Vec<Node>, incoming: Vec<Node>) {
    let mut incoming_by_id: HashMap<String, Node> = HashMap::with_capacity(incoming.len());
    let mut order = Vec::with_capacity(incoming.len());
    for node in incoming {
        order.push(node.id.clone());
        incoming_by_id.insert(node.id.clone(), node);
    }

    existing.retain_mut(|node| {
        if incoming_by_id.contains_key(&node.id) {
            return true;
        }
        if !node.holds_pending() {
            return false;
        }
        // keep the pending part of an unlisted folder, drop the rest
        if let Some(children) = node.children.as_mut() {
            merge_into(children, Vec::new());
        }
        true
    });

    for id in order {
        let Some(theirs) = incoming_by_id.remove(&id) else {
            continue;
        };
        match existing.iter_mut().find(|n| n.id == id) {
            Some(ours) if ours.is_leaf() && theirs.is_leaf() => merge_leaf(ours, theirs),
            Some(ours) if ours.is_folder() && theirs.is_folder() => {
                let children = ours.children.get_or_insert_with(Vec::new);
                merge_into(children, theirs.children.unwrap_or_default());
            }
            // kind changed remotely; unsynced local state keeps the old kind
            Some(ours) if ours.is_dirty || ours.holds_pending() => {
                if let Some(children) = ours.children.as_mut() {
                    merge_into(children, Vec::new());
                }
            }
            Some(ours) => *ours = theirs,
            None => existing.push(theirs),
        }
    }

    sort_recursive(existing);
}

/// Reconcile one listed leaf into its cached counterpart
pub(crate) fn merge_leaf(ours: &mut Node, theirs: Node) {
    ours.param_type = theirs.param_type;
    ours.last_modified = theirs.last_modified;

    if theirs.is_value_loaded {
        ours.adopt_server_value(theirs.server_value);
    } else if !ours.is_value_loaded && ours.value.is_none() && ours.server_value.is_none() {
        ours.server_value = theirs.server_value;
        ours.value.clone_from(&ours.server_value);
    }
}
