//! Testing utilities for paramcache
//!
//! Fixture builders for trees, seeded in-memory stores and engines that have
//! already run one load cycle.
//!
//! Only available when compiled with `cfg(test)`.

use crate::remote::MemoryStore;
use crate::sync::{SyncEngine, SyncSettings};
use crate::tree::{Entry, Node, ParameterType, Tree, build_tree, sibling_order};
use std::cmp::Ordering;
use std::sync::Arc;

/// Plain-string entry with a loaded value
#[must_use]
pub fn leaf_entry(path: &str, value: &str) -> Entry {
    Entry::new(path, Some(value.to_string())).with_type(ParameterType::PlainString)
}

/// Tree with one leaf per path, every value set to `"v"`
#[must_use]
pub fn tree_of(paths: &[&str]) -> Tree {
    build_tree(paths.iter().map(|p| leaf_entry(p, "v")).collect())
}

/// Assert folders-first, name-ordered siblings at every level
///
/// # Panics
/// Panics on the first pair of siblings out of order.
pub fn assert_sorted(tree: &Tree) {
    fn check(nodes: &[Node]) {
        for pair in nodes.windows(2) {
            assert_ne!(
                sibling_order(&pair[0], &pair[1]),
                Ordering::Greater,
                "{} sorted after {}",
                pair[0].id,
                pair[1].id
            );
        }
        for node in nodes {
            check(node.children());
        }
    }
    check(tree.roots());
}

/// In-memory store holding the given plain-string parameters
#[must_use]
pub fn seeded_store<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for (path, value) in entries {
        store.seed(path, value, ParameterType::PlainString);
    }
    store
}

/// Engine bound to a seeded store, after one completed load cycle
///
/// # Panics
/// Panics if the load cycle fails.
pub async fn engine_with(entries: &[(&str, &str)]) -> (SyncEngine, Arc<MemoryStore>) {
    let store = seeded_store(entries.iter().copied());
    let engine = SyncEngine::with_remote(SyncSettings::default(), store.clone());
    engine.reload().await.expect("initial load failed");
    store.reset_stats();
    (engine, store)
}
