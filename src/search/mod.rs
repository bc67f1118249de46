//! Ranked search over the parameter tree
//!
//! Matching is case-insensitive. Every node lands in at most one bucket, the
//! best it qualifies for, and buckets are returned in this order:
//! 1. Folder name equals the query
//! 2. Leaf name equals the query
//! 3. Folder name contains the query
//! 4. Leaf name contains the query
//! 5. Leaf path contains the query, ordered by how shallow the first matching
//!    ancestor is
//! 6. Leaf value contains the query (never for secure strings), with an excerpt
//!
//! Within a bucket hits are ordered by full path.

pub mod excerpt;

use crate::tree::node::compare_names;
use crate::tree::{Node, ParameterType, Tree, path};
use serde::Serialize;
use std::fmt;

/// Why a node matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MatchKind {
    FolderExact,
    LeafExact,
    FolderPartial,
    LeafPartial,
    Path,
    Value,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::FolderExact | Self::LeafExact => "name",
            Self::FolderPartial | Self::LeafPartial => "partial name",
            Self::Path => "path",
            Self::Value => "value",
        };
        f.write_str(label)
    }
}

/// One search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    pub is_folder: bool,
    pub kind: MatchKind,
    /// Part of the value around the match, for value hits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

struct Ranked {
    hit: SearchHit,
    /// Index of the first ancestor segment holding the query, path hits only
    depth: usize,
}

/// Search the tree for `query`
///
/// An empty or blank query finds nothing.
#[must_use]
pub fn search(tree: &Tree, query: &str) -> Vec<SearchHit> {
    let query = excerpt::fold(query.trim());
    if query.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<Ranked> = tree
        .walk()
        .into_iter()
        .filter_map(|node| classify(node, &query))
        .collect();
    ranked.sort_by(|a, b| {
        a.hit
            .kind
            .cmp(&b.hit.kind)
            .then(a.depth.cmp(&b.depth))
            .then_with(|| compare_names(&a.hit.id, &b.hit.id))
    });
    ranked.into_iter().map(|r| r.hit).collect()
}

fn classify(node: &Node, query: &str) -> Option<Ranked> {
    let name = excerpt::fold(&node.name);
    let hit = |kind, excerpt| SearchHit {
        id: node.id.clone(),
        name: node.name.clone(),
        is_folder: node.is_folder(),
        kind,
        excerpt,
    };

    if node.is_folder() {
        let kind = if name == query {
            MatchKind::FolderExact
        } else if name.contains(query) {
            MatchKind::FolderPartial
        } else {
            return None;
        };
        return Some(Ranked {
            hit: hit(kind, None),
            depth: 0,
        });
    }

    if name == query {
        return Some(Ranked {
            hit: hit(MatchKind::LeafExact, None),
            depth: 0,
        });
    }
    if name.contains(query) {
        return Some(Ranked {
            hit: hit(MatchKind::LeafPartial, None),
            depth: 0,
        });
    }
    if excerpt::fold(&node.id).contains(query) {
        return Some(Ranked {
            hit: hit(MatchKind::Path, None),
            depth: ancestor_depth(&node.id, query),
        });
    }

    if node.param_type == Some(ParameterType::SecureString) {
        return None;
    }
    let snippet = node.value.as_deref().and_then(|v| excerpt::excerpt(v, query))?;
    Some(Ranked {
        hit: hit(MatchKind::Value, Some(snippet)),
        depth: 0,
    })
}

/// Index of the first ancestor segment that holds the query
///
/// A query spanning a separator matches no single segment and sorts after
/// every depth.
fn ancestor_depth(id: &str, query: &str) -> usize {
    let segments = path::segments(id);
    let ancestors = segments.split_last().map_or(&[][..], |(_, rest)| rest);
    ancestors
        .iter()
        .position(|segment| excerpt::fold(segment).contains(query))
        .unwrap_or(usize::MAX)
}
