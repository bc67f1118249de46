//! Tree node type and sibling ordering
//!
//! A [`Node`] is either a folder or a leaf parameter. The kind is decided by
//! the presence of `children`, never by its length: an empty folder is still a
//! folder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Type tag of a stored parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterType {
    /// Plain text value
    #[serde(rename = "String")]
    PlainString,
    /// Comma separated list of values
    StringList,
    /// Encrypted value; never searched by content
    SecureString,
}

impl ParameterType {
    /// Whether values of this type are secret
    #[must_use]
    pub const fn is_secure(self) -> bool {
        matches!(self, Self::SecureString)
    }

    /// Name used by the remote store
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlainString => "String",
            Self::StringList => "StringList",
            Self::SecureString => "SecureString",
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ParameterType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" | "plain" | "plainstring" => Ok(Self::PlainString),
            "stringlist" | "list" => Ok(Self::StringList),
            "securestring" | "secure" => Ok(Self::SecureString),
            other => Err(format!("unknown parameter type '{other}'")),
        }
    }
}

/// A folder or leaf in the parameter tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Full path, unique across the tree
    pub id: String,
    /// Last path segment
    pub name: String,
    /// Locally displayed / edited value
    pub value: Option<String>,
    /// Last value confirmed by the remote store
    pub server_value: Option<String>,
    pub param_type: Option<ParameterType>,
    pub last_modified: Option<DateTime<Utc>>,
    /// `value != server_value`
    pub is_dirty: bool,
    /// An optimistic create is in flight
    pub is_pending: bool,
    /// The value has been fetched, not just the metadata
    pub is_value_loaded: bool,
    /// `None` for a leaf, `Some` (possibly empty) for a folder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Node>>,
}

impl Node {
    /// Create an empty folder node
    #[must_use]
    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            value: None,
            server_value: None,
            param_type: None,
            last_modified: None,
            is_dirty: false,
            is_pending: false,
            is_value_loaded: false,
            children: Some(Vec::new()),
        }
    }

    /// Create a leaf whose value is confirmed by the remote store
    ///
    /// The leaf counts as loaded iff a value is given.
    #[must_use]
    pub fn leaf(
        id: impl Into<String>,
        name: impl Into<String>,
        value: Option<String>,
        param_type: Option<ParameterType>,
        last_modified: Option<DateTime<Utc>>,
    ) -> Self {
        let is_value_loaded = value.is_some();
        Self {
            id: id.into(),
            name: name.into(),
            server_value: value.clone(),
            value,
            param_type,
            last_modified,
            is_dirty: false,
            is_pending: false,
            is_value_loaded,
            children: None,
        }
    }

    /// Create a leaf known only by its metadata
    #[must_use]
    pub fn placeholder(
        id: impl Into<String>,
        name: impl Into<String>,
        param_type: Option<ParameterType>,
        last_modified: Option<DateTime<Utc>>,
    ) -> Self {
        Self::leaf(id, name, None, param_type, last_modified)
    }

    /// Create an optimistic leaf for a create that has not been confirmed yet
    #[must_use]
    pub fn pending(
        id: impl Into<String>,
        name: impl Into<String>,
        value: String,
        param_type: ParameterType,
    ) -> Self {
        let mut node = Self::leaf(id, name, None, Some(param_type), None);
        node.value = Some(value);
        node.is_pending = true;
        node.refresh_dirty();
        node
    }

    #[must_use]
    pub const fn is_folder(&self) -> bool {
        self.children.is_some()
    }

    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Children of a folder, empty for a leaf
    #[must_use]
    pub fn children(&self) -> &[Node] {
        self.children.as_deref().unwrap_or_default()
    }

    /// Recompute the dirty flag from the two values
    pub fn refresh_dirty(&mut self) {
        self.is_dirty = self.value != self.server_value;
    }

    /// Set the local value, as done by a user edit
    pub fn edit(&mut self, value: impl Into<String>) {
        self.value = Some(value.into());
        self.refresh_dirty();
    }

    /// Take a value confirmed by the remote store
    ///
    /// A dirty leaf keeps its local value and only stops being dirty when the
    /// confirmed value caught up with it.
    pub fn adopt_server_value(&mut self, value: Option<String>) {
        self.server_value = value;
        self.is_value_loaded = true;
        if self.is_dirty {
            self.refresh_dirty();
        } else {
            self.value.clone_from(&self.server_value);
        }
    }

    /// Whether this node or anything below it is pending
    #[must_use]
    pub fn holds_pending(&self) -> bool {
        self.is_pending || self.children().iter().any(Node::holds_pending)
    }

    /// Number of leaves at or below this node
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match &self.children {
            None => 1,
            Some(children) => children.iter().map(Node::leaf_count).sum(),
        }
    }

    /// Append the ids of all leaves at or below this node
    pub fn collect_leaf_paths(&self, out: &mut Vec<String>) {
        match &self.children {
            None => out.push(self.id.clone()),
            Some(children) => {
                for child in children {
                    child.collect_leaf_paths(out);
                }
            }
        }
    }
}

/// Compare two names the way siblings are displayed
///
/// Case-insensitive, with the exact text as tie breaker so the order is total.
#[must_use]
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Sibling order: folders before leaves, then by name
#[must_use]
pub fn sibling_order(a: &Node, b: &Node) -> Ordering {
    b.is_folder()
        .cmp(&a.is_folder())
        .then_with(|| compare_names(&a.name, &b.name))
}

/// Sort a sibling list and every list below it
pub fn sort_recursive(nodes: &mut [Node]) {
    nodes.sort_by(sibling_order);
    for node in nodes.iter_mut() {
        if let Some(children) = node.children.as_mut() {
            sort_recursive(children);
        }
    }
}
