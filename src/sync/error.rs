//! Sync-specific error types
//!
//! - **`NotConfigured`**: no remote store is bound to the engine
//! - **`Remote`**: a remote call failed; scoped to the affected parameter name
//! - **`Validation`**: the request itself is invalid (empty name, path taken)
//! - **`NotFound`**: the id is not in the tree
//! - **`PartialFolderDelete`**: some leaf deletes of a folder delete failed
//! - **`Superseded`**: a newer load cycle replaced this one

use crate::remote::RemoteError;
use thiserror::Error;

/// Errors returned by the sync engine
#[derive(Debug, Error)]
pub enum SyncError {
    /// No remote store bound
    #[error("No remote store configured")]
    NotConfigured,

    /// A remote call failed
    #[error("{name}: {source}")]
    Remote {
        name: String,
        #[source]
        source: RemoteError,
    },

    /// Invalid request
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Unknown id
    #[error("Not found: {0}")]
    NotFound(String),

    /// A folder delete left some parameters behind
    #[error("Deleting {folder}: {failed} of {total} parameter(s) could not be deleted")]
    PartialFolderDelete {
        folder: String,
        failed: usize,
        total: usize,
    },

    /// The load cycle was replaced by a newer one
    #[error("Load cycle {generation} was superseded")]
    Superseded { generation: u64 },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
