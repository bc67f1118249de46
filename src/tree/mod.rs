//! Hierarchical parameter tree
//!
//! The tree is the single source of truth for the cache. It holds the
//! root-level siblings and keeps these invariants after every operation:
//!
//! - ids are unique and derived from the parent id plus the node name
//! - a node is a folder iff it has a children list
//! - siblings list folders first, then leaves, each group ordered by name
//!
//! Building from a flat listing lives in [`builder`], reconciliation of an
//! incoming snapshot in [`merge`].

pub mod builder;
pub mod error;
pub mod merge;
pub mod node;
pub mod path;

pub use builder::{Entry, build_tree};
pub use error::TreeError;
pub use merge::merge_into;
pub use node::{Node, ParameterType, sibling_order, sort_recursive};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Root container of the parameter tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    roots: Vec<Node>,
}

impl Tree {
    /// Create an empty tree
    #[must_use]
    pub const fn new() -> Self {
        Self { roots: Vec::new() }
    }

    /// Wrap root-level siblings, sorting them
    #[must_use]
    pub fn from_roots(mut roots: Vec<Node>) -> Self {
        sort_recursive(&mut roots);
        Self { roots }
    }

    /// Root-level siblings
    #[must_use]
    pub fn roots(&self) -> &[Node] {
        &self.roots
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Look up a node by id
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Node> {
        let mut level = self.roots.as_slice();
        let mut found = None;
        for segment in path::segments(id) {
            let node = level.iter().find(|n| n.name == segment)?;
            level = node.children();
            found = Some(node);
        }
        found
    }

    /// Look up a node by id for mutation
    pub fn find_mut(&mut self, id: &str) -> Option<&mut Node> {
        find_in_mut(&mut self.roots, &path::segments(id))
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Insert a leaf at its sorted position, creating missing folders
    ///
    /// The leaf's `id` and `name` are normalized from its id. An existing leaf
    /// at the same path is replaced and returned.
    ///
    /// # Errors
    ///
    /// Returns `TreeError` if the path is empty, an ancestor is a leaf, or a
    /// folder already occupies the path.
    pub fn insert_leaf(&mut self, mut leaf: Node) -> Result<Option<Node>, TreeError> {
        let raw = std::mem::take(&mut leaf.id);
        let segs = path::segments(&raw);
        let Some((name, parents)) = segs.split_last() else {
            return Err(TreeError::InvalidPath(raw));
        };
        let id = path::join(&segs);
        leaf.name = (*name).to_string();
        leaf.children = None;

        let mut level = &mut self.roots;
        for depth in 0..parents.len() {
            let folder_id = path::join(&segs[..=depth]);
            let pos = match level.iter().position(|n| n.name == parents[depth]) {
                Some(pos) if level[pos].is_leaf() => {
                    return Err(TreeError::LeafInTheWay {
                        path: id,
                        blocking: folder_id,
                    });
                }
                Some(pos) => pos,
                None => insert_sorted(level, Node::folder(folder_id, parents[depth])),
            };
            level = match level[pos].children.as_mut() {
                Some(children) => children,
                None => return Err(TreeError::InvalidPath(id)),
            };
        }

        leaf.id = id;
        match level.iter().position(|n| n.name == leaf.name) {
            Some(pos) if level[pos].is_folder() => Err(TreeError::FolderExists(leaf.id)),
            Some(pos) => Ok(Some(std::mem::replace(&mut level[pos], leaf))),
            None => {
                insert_sorted(level, leaf);
                Ok(None)
            }
        }
    }

    /// Insert a leaf, dropping a leaf that sits where a folder is needed
    ///
    /// A folder always wins over a leaf at the same path. Returns the dropped
    /// leaf, if any. Pending and dirty leaves are never dropped.
    ///
    /// # Errors
    ///
    /// Returns `TreeError` for the cases [`Tree::insert_leaf`] rejects, except
    /// a clean leaf in the way.
    pub fn insert_leaf_displacing(&mut self, leaf: Node) -> Result<Option<Node>, TreeError> {
        match self.insert_leaf(leaf.clone()) {
            Ok(_) => Ok(None),
            Err(TreeError::LeafInTheWay { blocking, path })
                if self.find(&blocking).is_some_and(|n| !n.is_pending && !n.is_dirty) =>
            {
                let displaced = self.remove(&blocking, false);
                self.insert_leaf(leaf)?;
                tracing::debug!(%path, %blocking, "folder displaced a leaf");
                Ok(displaced)
            }
            Err(err) => Err(err),
        }
    }

    /// Remove a node (and its subtree) by id
    ///
    /// With `collapse_empty`, ancestor folders left without children are
    /// removed as well.
    pub fn remove(&mut self, id: &str, collapse_empty: bool) -> Option<Node> {
        remove_in(&mut self.roots, &path::segments(id), collapse_empty)
    }

    /// Reconcile an incoming snapshot into this tree
    pub fn merge(&mut self, incoming: Self) {
        merge_into(&mut self.roots, incoming.roots);
    }

    /// Ids of all leaves, in display order
    #[must_use]
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        for node in &self.roots {
            node.collect_leaf_paths(&mut out);
        }
        out
    }

    /// All leaves, in display order
    #[must_use]
    pub fn leaves(&self) -> Vec<&Node> {
        self.walk().into_iter().filter(|n| n.is_leaf()).collect()
    }

    /// All nodes depth-first, in display order
    #[must_use]
    pub fn walk(&self) -> Vec<&Node> {
        fn visit<'a>(nodes: &'a [Node], out: &mut Vec<&'a Node>) {
            for node in nodes {
                out.push(node);
                visit(node.children(), out);
            }
        }
        let mut out = Vec::new();
        visit(&self.roots, &mut out);
        out
    }

    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.roots.iter().map(Node::leaf_count).sum()
    }

    #[must_use]
    pub fn folder_count(&self) -> usize {
        self.walk().iter().filter(|n| n.is_folder()).count()
    }
}

fn insert_sorted(level: &mut Vec<Node>, node: Node) -> usize {
    let pos = level.partition_point(|n| sibling_order(n, &node) == Ordering::Less);
    level.insert(pos, node);
    pos
}

fn find_in_mut<'a>(nodes: &'a mut [Node], segs: &[&str]) -> Option<&'a mut Node> {
    let (first, rest) = segs.split_first()?;
    let node = nodes.iter_mut().find(|n| n.name == *first)?;
    if rest.is_empty() {
        Some(node)
    } else {
        find_in_mut(node.children.as_mut()?, rest)
    }
}

fn remove_in(nodes: &mut Vec<Node>, segs: &[&str], collapse_empty: bool) -> Option<Node> {
    let (first, rest) = segs.split_first()?;
    let pos = nodes.iter().position(|n| n.name == *first)?;
    if rest.is_empty() {
        return Some(nodes.remove(pos));
    }
    let children = nodes[pos].children.as_mut()?;
    let removed = remove_in(children, rest, collapse_empty)?;
    if collapse_empty && children.is_empty() {
        nodes.remove(pos);
    }
    Some(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{assert_sorted, leaf_entry, tree_of};

    #[test]
    fn test_find_nested() {
        let tree = tree_of(&["/a/b/c", "/a/d"]);
        assert!(tree.find("/a").is_some_and(Node::is_folder));
        assert!(tree.find("/a/b/c").is_some_and(Node::is_leaf));
        assert!(tree.find("/a/b/x").is_none());
        assert!(tree.find("/").is_none());
    }

    #[test]
    fn test_insert_creates_folders_in_order() {
        let mut tree = Tree::new();
        tree.insert_leaf(Node::pending("a/b/c", "", "v".into(), ParameterType::PlainString))
            .unwrap();
        tree.insert_leaf(Node::leaf("/a/a", "", None, None, None)).unwrap();
        tree.insert_leaf(Node::leaf("/a/z", "", None, None, None)).unwrap();

        let a = tree.find("/a").unwrap();
        let names: Vec<&str> = a.children().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "z"]);
        let c = tree.find("/a/b/c").unwrap();
        assert_eq!(c.id, "/a/b/c");
        assert_eq!(c.name, "c");
        assert_sorted(&tree);
    }

    #[test]
    fn test_insert_replaces_existing_leaf() {
        let mut tree = tree_of(&["/k"]);
        let old = tree
            .insert_leaf(Node::leaf("/k", "k", Some("new".into()), None, None))
            .unwrap();
        assert!(old.is_some());
        assert_eq!(tree.find("/k").unwrap().value.as_deref(), Some("new"));
    }

    #[test]
    fn test_insert_rejects_leaf_in_the_way() {
        let mut tree = tree_of(&["/a"]);
        let err = tree
            .insert_leaf(Node::leaf("/a/b", "b", None, None, None))
            .unwrap_err();
        assert!(matches!(err, TreeError::LeafInTheWay { .. }));
    }

    #[test]
    fn test_insert_rejects_folder_collision() {
        let mut tree = tree_of(&["/a/b"]);
        let err = tree.insert_leaf(Node::leaf("/a", "a", None, None, None)).unwrap_err();
        assert_eq!(err, TreeError::FolderExists("/a".into()));
    }

    #[test]
    fn test_insert_rejects_empty_path() {
        let mut tree = Tree::new();
        let err = tree.insert_leaf(Node::leaf("//", "", None, None, None)).unwrap_err();
        assert!(matches!(err, TreeError::InvalidPath(_)));
    }

    #[test]
    fn test_insert_displacing_drops_shadowed_leaf() {
        let mut tree = tree_of(&["/a"]);
        let displaced = tree
            .insert_leaf_displacing(Node::leaf("/a/b", "b", None, None, None))
            .unwrap();
        assert_eq!(displaced.map(|n| n.id), Some("/a".to_string()));
        assert!(tree.find("/a").is_some_and(Node::is_folder));
        assert!(tree.contains("/a/b"));
    }

    #[test]
    fn test_insert_displacing_keeps_pending_leaf() {
        let mut tree = Tree::new();
        tree.insert_leaf(Node::pending("/a", "a", "v".into(), ParameterType::PlainString))
            .unwrap();
        let err = tree
            .insert_leaf_displacing(Node::leaf("/a/b", "b", None, None, None))
            .unwrap_err();
        assert!(matches!(err, TreeError::LeafInTheWay { .. }));
        assert!(tree.find("/a").is_some_and(|n| n.is_pending));
    }

    #[test]
    fn test_insert_displacing_keeps_dirty_leaf() {
        let mut tree = tree_of(&["/a"]);
        tree.find_mut("/a").unwrap().edit("unsaved");
        let err = tree
            .insert_leaf_displacing(Node::leaf("/a/b", "b", None, None, None))
            .unwrap_err();
        assert!(matches!(err, TreeError::LeafInTheWay { .. }));
        assert_eq!(tree.find("/a").unwrap().value.as_deref(), Some("unsaved"));
    }

    #[test]
    fn test_remove_with_collapse() {
        let mut tree = tree_of(&["/a/b/c", "/x"]);
        let removed = tree.remove("/a/b/c", true).unwrap();
        assert_eq!(removed.id, "/a/b/c");
        assert!(tree.find("/a").is_none());
        assert!(tree.find("/x").is_some());
    }

    #[test]
    fn test_remove_without_collapse_keeps_folder() {
        let mut tree = tree_of(&["/a/b"]);
        tree.remove("/a/b", false).unwrap();
        assert!(tree.find("/a").is_some_and(|n| n.children().is_empty()));
    }

    #[test]
    fn test_counts_and_paths() {
        let tree = build_tree(vec![
            leaf_entry("/z", "1"),
            leaf_entry("/a/b", "2"),
            leaf_entry("/a/c/d", "3"),
        ]);
        assert_eq!(tree.leaf_count(), 3);
        assert_eq!(tree.folder_count(), 2);
        assert_eq!(tree.leaf_paths(), vec!["/a/c/d", "/a/b", "/z"]);
        assert_eq!(tree.leaves().len(), 3);
    }
}
