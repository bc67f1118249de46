//! Tree-specific error types
//!
//! These errors come from structural edits of the tree: inserting a leaf where
//! the path is invalid or already taken by a node of the other kind.

use thiserror::Error;

/// Structural tree errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The path has no usable segments
    #[error("Invalid path: '{0}'")]
    InvalidPath(String),

    /// A leaf sits where a folder is needed
    #[error("Cannot create '{path}': '{blocking}' is a parameter, not a folder")]
    LeafInTheWay { path: String, blocking: String },

    /// A folder already exists at the leaf's path
    #[error("Cannot create '{0}': a folder with that path exists")]
    FolderExists(String),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
