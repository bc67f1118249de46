//! Remote store boundary
//!
//! The cache talks to the remote parameter store only through the
//! [`RemoteStore`] trait. Two implementations ship with the crate:
//!
//! - [`MemoryStore`]: in-process store with fault injection, for tests and
//!   embedders
//! - [`FileStore`]: JSON file on disk, used by the command-line front-end
//!
//! Both keep their data in a [`Catalog`], which owns the listing and paging
//! semantics.

pub mod catalog;
pub mod error;
pub mod file;
pub mod memory;
pub mod pager;

pub use catalog::{Catalog, StoredParameter};
pub use error::RemoteError;
pub use file::FileStore;
pub use memory::{CallStats, MemoryStore};
pub use pager::MetadataPager;

use crate::tree::{Entry, ParameterType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Largest page the store hands out for one listing call
pub const MAX_PAGE_SIZE: usize = 50;

/// Largest number of paths one value fetch accepts
pub const MAX_VALUE_BATCH: usize = 10;

/// Metadata of one stored parameter, without its value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub path: String,
    pub param_type: Option<ParameterType>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl From<MetadataEntry> for Entry {
    fn from(entry: MetadataEntry) -> Self {
        Self {
            path: entry.path,
            value: None,
            param_type: entry.param_type,
            last_modified: entry.last_modified,
        }
    }
}

/// One page of a metadata listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataPage {
    pub entries: Vec<MetadataEntry>,
    /// Continuation token; `None` on the last page
    pub next_token: Option<String>,
}

/// Value of one stored parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueEntry {
    pub path: String,
    pub value: String,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Typed client of the remote parameter store
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// List metadata recursively below `path_prefix`, one page at a time
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the listing call fails.
    async fn list_metadata_page(
        &self,
        path_prefix: &str,
        page_size: usize,
        continuation: Option<String>,
    ) -> Result<MetadataPage, RemoteError>;

    /// Fetch the values of up to [`MAX_VALUE_BATCH`] paths
    ///
    /// Unknown paths are left out of the result.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the batch fails as a whole.
    async fn get_values(&self, paths: &[String]) -> Result<Vec<ValueEntry>, RemoteError>;

    /// Create or overwrite a parameter, returning its new modification time
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the write is rejected.
    async fn put_value(
        &self,
        path: &str,
        value: &str,
        is_secure: bool,
    ) -> Result<DateTime<Utc>, RemoteError>;

    /// Delete a parameter
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the parameter does not exist or the delete is
    /// rejected.
    async fn delete_value(&self, path: &str) -> Result<(), RemoteError>;
}

/// Lock a mutex, recovering the data of a poisoned lock
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
