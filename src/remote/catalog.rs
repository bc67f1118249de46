//! Ordered parameter map with the remote store's semantics
//!
//! Listing is recursive below a prefix, on segment boundaries, in path order.
//! The continuation token of a page is the last path it returned; the next
//! page starts strictly after it.

use super::{MAX_PAGE_SIZE, MAX_VALUE_BATCH, MetadataEntry, MetadataPage, RemoteError, ValueEntry};
use crate::tree::{ParameterType, path};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Bound;

/// A parameter as the store keeps it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredParameter {
    pub value: String,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    pub last_modified: DateTime<Utc>,
}

/// All parameters of a store, keyed by normalized path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    parameters: BTreeMap<String, StoredParameter>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a parameter directly, bypassing the write rules
    pub fn insert(&mut self, path: &str, value: impl Into<String>, param_type: ParameterType) {
        self.parameters.insert(
            path::normalize(path),
            StoredParameter {
                value: value.into(),
                param_type,
                last_modified: Utc::now(),
            },
        );
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&StoredParameter> {
        self.parameters.get(&path::normalize(path))
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// All stored paths in order
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.parameters.keys().cloned().collect()
    }

    /// One page of metadata below `prefix`
    ///
    /// `page_size` is clamped to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn list_page(&self, prefix: &str, page_size: usize, token: Option<&str>) -> MetadataPage {
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let start = token.map_or(Bound::Unbounded, |t| Bound::Excluded(t.to_string()));

        let mut matching = self
            .parameters
            .range((start, Bound::Unbounded))
            .filter(|(p, _)| path::is_within(p, prefix));

        let entries: Vec<MetadataEntry> = matching
            .by_ref()
            .take(page_size)
            .map(|(p, param)| MetadataEntry {
                path: p.clone(),
                param_type: Some(param.param_type),
                last_modified: Some(param.last_modified),
            })
            .collect();

        let next_token = if matching.next().is_some() {
            entries.last().map(|e| e.path.clone())
        } else {
            None
        };

        MetadataPage {
            entries,
            next_token,
        }
    }

    /// Values of the given paths; unknown paths are skipped
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if more than `MAX_VALUE_BATCH` paths are asked for.
    pub fn values(&self, paths: &[String]) -> Result<Vec<ValueEntry>, RemoteError> {
        if paths.len() > MAX_VALUE_BATCH {
            return Err(RemoteError::new(format!(
                "at most {MAX_VALUE_BATCH} parameters per request, got {}",
                paths.len()
            )));
        }
        Ok(paths
            .iter()
            .filter_map(|p| {
                self.get(p).map(|param| ValueEntry {
                    path: path::normalize(p),
                    value: param.value.clone(),
                    last_modified: Some(param.last_modified),
                })
            })
            .collect())
    }

    /// Create or overwrite a parameter
    ///
    /// A non-secure write keeps a `StringList` type, anything else becomes a
    /// plain string.
    pub fn put(&mut self, path: &str, value: &str, is_secure: bool) -> DateTime<Utc> {
        let key = path::normalize(path);
        let param_type = if is_secure {
            ParameterType::SecureString
        } else {
            match self.parameters.get(&key) {
                Some(existing) if existing.param_type == ParameterType::StringList => {
                    ParameterType::StringList
                }
                _ => ParameterType::PlainString,
            }
        };
        let now = Utc::now();
        self.parameters.insert(
            key,
            StoredParameter {
                value: value.to_string(),
                param_type,
                last_modified: now,
            },
        );
        now
    }

    /// Delete a parameter
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the parameter does not exist.
    pub fn delete(&mut self, path: &str) -> Result<(), RemoteError> {
        self.parameters
            .remove(&path::normalize(path))
            .map(|_| ())
            .ok_or_else(|| RemoteError::new(format!("parameter not found: {path}")))
    }
}
