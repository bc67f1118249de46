//! Paramcache - a client-side cache of a hierarchical parameter store
//!
//! This library mirrors a remote key/value parameter store as a sorted folder
//! tree, loads it in two phases (paged metadata, then batched values), and
//! applies edits optimistically before the remote store confirms them.

use thiserror::Error;

pub mod cli;
pub mod commands;
pub mod config;
pub mod output;
pub mod remote;
pub mod search;
pub mod sync;
pub mod tree;

#[cfg(test)]
pub mod testing;

/// Error enum, contains all failure states of the program
#[derive(Debug, Error)]
pub enum ParamCacheError {
    /// Cache or remote operation failed
    #[error(transparent)]
    Sync(#[from] sync::SyncError),
    /// Remote store failed outside a cache operation
    #[error("Store error: {0}")]
    Remote(#[from] remote::RemoteError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ::config::ConfigError),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// JSON output failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
