//! In-process remote store
//!
//! Behaves like the real store over a [`Catalog`] and lets callers inject
//! failures per operation and per path, pause listing, value fetches and
//! writes, and inspect how the store was called.

use super::{Catalog, MetadataPage, RemoteError, RemoteStore, ValueEntry, lock};
use crate::tree::ParameterType;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Failures the store will produce on purpose
#[derive(Debug, Clone, Default)]
struct Faults {
    /// Listing calls fail once this many pages have been served
    listing: Option<usize>,
    value_paths: HashSet<String>,
    puts: HashSet<String>,
    deletes: HashSet<String>,
}

/// Record of how the store has been called
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallStats {
    pub pages_listed: usize,
    /// Size of every value batch requested, in call order
    pub value_batches: Vec<usize>,
    /// Most value batches outstanding at the same time
    pub peak_values_in_flight: usize,
    pub puts: Vec<String>,
    pub deletes: Vec<String>,
}

/// Remote store kept in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    catalog: Mutex<Catalog>,
    faults: Mutex<Faults>,
    stats: Mutex<CallStats>,
    values_in_flight: AtomicUsize,
    listing_gate: Mutex<Option<Arc<Semaphore>>>,
    value_gate: Mutex<Option<Arc<Semaphore>>>,
    write_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a parameter without going through `put_value`
    pub fn seed(&self, path: &str, value: &str, param_type: ParameterType) {
        lock(&self.catalog).insert(path, value, param_type);
    }

    /// Copy of the stored parameters
    #[must_use]
    pub fn catalog(&self) -> Catalog {
        lock(&self.catalog).clone()
    }

    #[must_use]
    pub fn stats(&self) -> CallStats {
        lock(&self.stats).clone()
    }

    pub fn reset_stats(&self) {
        *lock(&self.stats) = CallStats::default();
    }

    /// Make every listing call fail
    pub fn fail_listing(&self, fail: bool) {
        lock(&self.faults).listing = fail.then_some(0);
    }

    /// Serve `pages` more listing pages, then fail every later listing call
    ///
    /// Counts against [`CallStats::pages_listed`], so reset the stats first.
    pub fn fail_listing_after(&self, pages: usize) {
        lock(&self.faults).listing = Some(pages);
    }

    /// Make any value batch containing `path` fail
    pub fn fail_values_for(&self, path: &str) {
        lock(&self.faults).value_paths.insert(path.to_string());
    }

    pub fn fail_put(&self, path: &str) {
        lock(&self.faults).puts.insert(path.to_string());
    }

    pub fn fail_delete(&self, path: &str) {
        lock(&self.faults).deletes.insert(path.to_string());
    }

    pub fn clear_faults(&self) {
        *lock(&self.faults) = Faults::default();
    }

    /// Hold every listing page, once computed, until
    /// [`MemoryStore::resume_listing`] is called
    pub fn pause_listing(&self) {
        close_gate(&self.listing_gate, Some(Arc::new(Semaphore::new(0))));
    }

    pub fn resume_listing(&self) {
        close_gate(&self.listing_gate, None);
    }

    /// Hold every value fetch until [`MemoryStore::resume_values`] is called
    pub fn pause_values(&self) {
        close_gate(&self.value_gate, Some(Arc::new(Semaphore::new(0))));
    }

    /// Release held and future value fetches
    pub fn resume_values(&self) {
        close_gate(&self.value_gate, None);
    }

    /// Hold every put until [`MemoryStore::resume_writes`] is called
    pub fn pause_writes(&self) {
        close_gate(&self.write_gate, Some(Arc::new(Semaphore::new(0))));
    }

    pub fn resume_writes(&self) {
        close_gate(&self.write_gate, None);
    }
}

fn close_gate(slot: &Mutex<Option<Arc<Semaphore>>>, next: Option<Arc<Semaphore>>) {
    if let Some(gate) = std::mem::replace(&mut *lock(slot), next) {
        gate.close();
    }
}

async fn pass(slot: &Mutex<Option<Arc<Semaphore>>>) {
    let gate = lock(slot).clone();
    if let Some(gate) = gate {
        // a closed gate lets everything through
        let _ = gate.acquire().await;
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list_metadata_page(
        &self,
        path_prefix: &str,
        page_size: usize,
        continuation: Option<String>,
    ) -> Result<MetadataPage, RemoteError> {
        let listed = {
            let mut stats = lock(&self.stats);
            stats.pages_listed += 1;
            stats.pages_listed
        };
        if lock(&self.faults).listing.is_some_and(|served| listed > served) {
            return Err(RemoteError::new("listing failed"));
        }
        tokio::task::yield_now().await;
        let page = lock(&self.catalog).list_page(path_prefix, page_size, continuation.as_deref());
        pass(&self.listing_gate).await;
        Ok(page)
    }

    async fn get_values(&self, paths: &[String]) -> Result<Vec<ValueEntry>, RemoteError> {
        let in_flight = self.values_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut stats = lock(&self.stats);
            stats.value_batches.push(paths.len());
            stats.peak_values_in_flight = stats.peak_values_in_flight.max(in_flight);
        }

        pass(&self.value_gate).await;
        tokio::task::yield_now().await;
        self.values_in_flight.fetch_sub(1, Ordering::SeqCst);

        let failing = {
            let faults = lock(&self.faults);
            paths.iter().find(|p| faults.value_paths.contains(*p)).cloned()
        };
        if let Some(path) = failing {
            return Err(RemoteError::new(format!("value fetch failed for {path}")));
        }
        lock(&self.catalog).values(paths)
    }

    async fn put_value(
        &self,
        path: &str,
        value: &str,
        is_secure: bool,
    ) -> Result<DateTime<Utc>, RemoteError> {
        lock(&self.stats).puts.push(path.to_string());
        pass(&self.write_gate).await;
        tokio::task::yield_now().await;
        if lock(&self.faults).puts.contains(path) {
            return Err(RemoteError::new(format!("write rejected for {path}")));
        }
        Ok(lock(&self.catalog).put(path, value, is_secure))
    }

    async fn delete_value(&self, path: &str) -> Result<(), RemoteError> {
        lock(&self.stats).deletes.push(path.to_string());
        tokio::task::yield_now().await;
        if lock(&self.faults).deletes.contains(path) {
            return Err(RemoteError::new(format!("delete rejected for {path}")));
        }
        lock(&self.catalog).delete(path)
    }
}
