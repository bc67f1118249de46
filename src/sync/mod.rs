//! Sync engine: two-phase loading and optimistic mutation
//!
//! The [`SyncEngine`] owns the cached tree and keeps it in step with the
//! remote store:
//!
//! 1. **Metadata phase**: page through the listing, insert placeholders, then
//!    merge the complete listing into the tree
//! 2. **Value phase**: fetch values in concurrent batches and apply each batch
//!    as it arrives
//!
//! Local edits, creates and deletes are applied to the tree first and
//! confirmed or rolled back once the remote call returns.

pub mod engine;
pub mod error;
pub mod load;
pub mod mutation;
pub mod status;

pub use engine::SyncEngine;
pub use error::SyncError;
pub use load::LoadSummary;
pub use mutation::FolderDeleteSummary;
pub use status::{LoadPhase, Progress, SyncStatus};

use crate::remote::{MAX_PAGE_SIZE, MAX_VALUE_BATCH};
use serde::{Deserialize, Serialize};

/// Tuning of the load cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Path the listing starts from
    pub root_path: String,
    /// Entries per metadata page, at most 50
    pub page_size: usize,
    /// Paths per value fetch, at most 10
    pub value_batch_size: usize,
    /// Remote calls outstanding at once during value loading and folder deletes
    pub max_in_flight: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            root_path: "/".to_string(),
            page_size: MAX_PAGE_SIZE,
            value_batch_size: MAX_VALUE_BATCH,
            max_in_flight: 16,
        }
    }
}

impl SyncSettings {
    /// Check the settings against the store's limits
    ///
    /// # Errors
    ///
    /// Returns a message naming the first setting out of range.
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(format!("page_size must be between 1 and {MAX_PAGE_SIZE}"));
        }
        if !(1..=MAX_VALUE_BATCH).contains(&self.value_batch_size) {
            return Err(format!("value_batch_size must be between 1 and {MAX_VALUE_BATCH}"));
        }
        if self.max_in_flight == 0 {
            return Err("max_in_flight must be at least 1".to_string());
        }
        Ok(())
    }

    pub(crate) fn page_size(&self) -> usize {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    pub(crate) fn value_batch_size(&self) -> usize {
        self.value_batch_size.clamp(1, MAX_VALUE_BATCH)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = SyncSettings::default();
        assert_eq!(settings.page_size, 50);
        assert_eq!(settings.value_batch_size, 10);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_settings_rejected() {
        let settings = SyncSettings {
            page_size: 51,
            ..SyncSettings::default()
        };
        assert!(settings.validate().unwrap_err().contains("page_size"));

        let settings = SyncSettings {
            value_batch_size: 0,
            ..SyncSettings::default()
        };
        assert!(settings.validate().unwrap_err().contains("value_batch_size"));

        let settings = SyncSettings {
            max_in_flight: 0,
            ..SyncSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_accessors_clamp() {
        let settings = SyncSettings {
            root_path: "/".into(),
            page_size: 500,
            value_batch_size: 0,
            max_in_flight: 0,
        };
        assert_eq!(settings.page_size(), 50);
        assert_eq!(settings.value_batch_size(), 1);
        assert_eq!(settings.max_in_flight(), 1);
    }
}
