//! Build a tree from a flat listing
//!
//! Takes entries like `/app/db/host`, `/app/db/port`, `/global` and produces:
//! - app (folder)
//!   - db (folder)
//!     - host
//!     - port
//! - global

use super::{Node, ParameterType, Tree, node::sort_recursive, path};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One remote record: path, value, type and modification time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub path: String,
    pub value: Option<String>,
    pub param_type: Option<ParameterType>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl Entry {
    #[must_use]
    pub fn new(path: impl Into<String>, value: Option<String>) -> Self {
        Self {
            path: path.into(),
            value,
            param_type: None,
            last_modified: None,
        }
    }

    #[must_use]
    pub const fn with_type(mut self, param_type: ParameterType) -> Self {
        self.param_type = Some(param_type);
        self
    }

    #[must_use]
    pub const fn with_last_modified(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified = Some(at);
        self
    }
}

/// Build a sorted tree from a flat list of entries
///
/// Entries are sorted by path first so the result does not depend on input
/// order; for duplicate paths the last entry wins. A leaf that collides with a
/// folder needed by a deeper path is dropped.
#[must_use]
pub fn build_tree(entries: Vec<Entry>) -> Tree {
    let mut keyed: Vec<(String, Entry)> = entries
        .into_iter()
        .map(|entry| (path::normalize(&entry.path), entry))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    let mut tree = Tree::new();
    for (id, entry) in keyed {
        let leaf = Node::leaf(
            id.clone(),
            path::name_of(&id),
            entry.value,
            entry.param_type,
            entry.last_modified,
        );
        match tree.insert_leaf_displacing(leaf) {
            Ok(Some(shadowed)) => {
                warn!(path = %shadowed.id, "dropping parameter shadowed by a folder");
            }
            Ok(None) => {}
            Err(err) => warn!(path = %id, error = %err, "skipping entry"),
        }
    }

    let mut roots = tree.roots;
    sort_recursive(&mut roots);
    Tree { roots }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{assert_sorted, leaf_entry};
    use std::collections::BTreeSet;

    #[test]
    fn test_build_round_trips_paths() {
        let paths = ["/app/db/host", "/app/db/port", "/app/name", "/global", "/x/y/z/w"];
        let tree = build_tree(paths.iter().map(|p| leaf_entry(p, "v")).collect());

        let built: BTreeSet<String> = tree.leaf_paths().into_iter().collect();
        let expected: BTreeSet<String> = paths.iter().map(|p| (*p).to_string()).collect();
        assert_eq!(built, expected);
        assert_sorted(&tree);
    }

    #[test]
    fn test_build_is_order_independent() {
        let a = build_tree(vec![leaf_entry("/b/x", "1"), leaf_entry("/a", "2")]);
        let b = build_tree(vec![leaf_entry("/a", "2"), leaf_entry("/b/x", "1")]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_build_is_idempotent() {
        let entries = vec![leaf_entry("/s/db", "1"), leaf_entry("/s/api/key", "2")];
        assert_eq!(build_tree(entries.clone()), build_tree(entries));
    }

    #[test]
    fn test_built_leaves_carry_metadata() {
        let at = Utc::now();
        let tree = build_tree(vec![
            Entry::new("/secret", Some("s".into()))
                .with_type(ParameterType::SecureString)
                .with_last_modified(at),
            Entry::new("/meta-only", None),
        ]);
        let secret = tree.find("/secret").unwrap();
        assert_eq!(secret.param_type, Some(ParameterType::SecureString));
        assert_eq!(secret.last_modified, Some(at));
        assert!(secret.is_value_loaded);
        assert!(!secret.is_dirty);
        assert!(!tree.find("/meta-only").unwrap().is_value_loaded);
    }

    #[test]
    fn test_folder_wins_over_shadowed_leaf() {
        let tree = build_tree(vec![leaf_entry("/a", "leaf"), leaf_entry("/a/b", "deep")]);
        assert!(tree.find("/a").is_some_and(Node::is_folder));
        assert_eq!(tree.find("/a/b").unwrap().value.as_deref(), Some("deep"));
    }

    #[test]
    fn test_duplicate_paths_last_wins() {
        let tree = build_tree(vec![leaf_entry("/k", "first"), leaf_entry("/k", "second")]);
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.find("/k").unwrap().value.as_deref(), Some("second"));
    }
}
