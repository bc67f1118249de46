//! Engine handle and shared state
//!
//! All tree mutations go through [`SyncEngine::mutate`] or
//! [`SyncEngine::mutate_current`]: one short critical section on a
//! `std::sync::Mutex`, never held across an `.await`. The tree lives in an
//! `Arc` and is changed with `Arc::make_mut`, so snapshots handed out earlier
//! never change under their readers.

use super::{SyncError, SyncSettings, SyncStatus};
use crate::remote::{RemoteStore, lock};
use crate::search::{self, SearchHit};
use crate::tree::{Node, Tree, path};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::debug;

struct CacheState {
    tree: Arc<Tree>,
    generation: u64,
    /// Error the last load cycle published, if any
    load_error: Option<String>,
}

struct EngineInner {
    settings: SyncSettings,
    remote: Mutex<Option<Arc<dyn RemoteStore>>>,
    state: Mutex<CacheState>,
    status: watch::Sender<SyncStatus>,
}

/// Cached parameter tree kept in step with a remote store
///
/// Cloning is cheap; clones share the same tree and status.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("settings", &self.inner.settings)
            .field("status", &*self.inner.status.borrow())
            .finish_non_exhaustive()
    }
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new(SyncSettings::default())
    }
}

impl SyncEngine {
    /// Create an engine with an empty tree and no remote store
    #[must_use]
    pub fn new(settings: SyncSettings) -> Self {
        let (status, _) = watch::channel(SyncStatus::default());
        Self {
            inner: Arc::new(EngineInner {
                settings,
                remote: Mutex::new(None),
                state: Mutex::new(CacheState {
                    tree: Arc::new(Tree::new()),
                    generation: 0,
                    load_error: None,
                }),
                status,
            }),
        }
    }

    /// Create an engine already bound to a remote store
    #[must_use]
    pub fn with_remote(settings: SyncSettings, remote: Arc<dyn RemoteStore>) -> Self {
        let engine = Self::new(settings);
        engine.bind(remote);
        engine
    }

    #[must_use]
    pub fn settings(&self) -> &SyncSettings {
        &self.inner.settings
    }

    /// Bind a remote store, superseding any running load cycle
    ///
    /// The cached tree is kept; the next [`SyncEngine::reload`] reconciles it
    /// against the new store.
    pub fn bind(&self, remote: Arc<dyn RemoteStore>) {
        *lock(&self.inner.remote) = Some(remote);
        let generation = self.supersede();
        debug!(generation, "remote store bound");
    }

    /// Drop the remote store and the cached tree
    pub fn unbind(&self) {
        *lock(&self.inner.remote) = None;
        let generation = {
            let mut state = lock(&self.inner.state);
            state.generation += 1;
            state.tree = Arc::new(Tree::new());
            state.load_error = None;
            state.generation
        };
        self.inner.status.send_replace(SyncStatus {
            generation,
            ..SyncStatus::default()
        });
        debug!(generation, "remote store unbound");
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        lock(&self.inner.remote).is_some()
    }

    /// Current tree snapshot
    #[must_use]
    pub fn snapshot(&self) -> Arc<Tree> {
        Arc::clone(&lock(&self.inner.state).tree)
    }

    /// Current tree snapshot; same as [`SyncEngine::snapshot`]
    #[must_use]
    pub fn get_root(&self) -> Arc<Tree> {
        self.snapshot()
    }

    /// Copy of the node with the given id
    #[must_use]
    pub fn find_node(&self, id: &str) -> Option<Node> {
        self.snapshot().find(&path::normalize(id)).cloned()
    }

    /// Generation of the current or last load cycle
    #[must_use]
    pub fn generation(&self) -> u64 {
        lock(&self.inner.state).generation
    }

    /// Latest status
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        self.inner.status.borrow().clone()
    }

    /// Receiver that sees every later status change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.inner.status.subscribe()
    }

    /// Ranked search over the current snapshot
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        search::search(&self.snapshot(), query)
    }

    /// Set a leaf's local value without contacting the remote store
    ///
    /// # Errors
    ///
    /// Returns `SyncError::NotFound` for an unknown id and
    /// `SyncError::Validation` for a folder.
    pub fn edit_local_value(&self, id: &str, value: &str) -> Result<(), SyncError> {
        let id = path::normalize(id);
        let result = self.mutate(|tree| {
            let node = tree
                .find_mut(&id)
                .ok_or_else(|| SyncError::NotFound(id.clone()))?;
            if node.is_folder() {
                return Err(SyncError::Validation(format!("{id} is a folder")));
            }
            node.edit(value);
            Ok(node.is_dirty)
        });
        match result {
            Ok(dirty) => {
                debug!(%id, dirty, "local edit");
                Ok(())
            }
            Err(err) => Err(self.record_error(err)),
        }
    }

    pub(crate) fn remote(&self) -> Result<Arc<dyn RemoteStore>, SyncError> {
        lock(&self.inner.remote)
            .clone()
            .ok_or(SyncError::NotConfigured)
    }

    /// Apply a change to the tree
    pub(crate) fn mutate<R>(&self, apply: impl FnOnce(&mut Tree) -> R) -> R {
        let mut state = lock(&self.inner.state);
        apply(Arc::make_mut(&mut state.tree))
    }

    /// Apply a change only while `generation` is still the current cycle
    pub(crate) fn mutate_current<R>(
        &self,
        generation: u64,
        apply: impl FnOnce(&mut Tree) -> R,
    ) -> Result<R, SyncError> {
        let mut state = lock(&self.inner.state);
        if state.generation != generation {
            return Err(SyncError::Superseded { generation });
        }
        Ok(apply(Arc::make_mut(&mut state.tree)))
    }

    pub(crate) fn ensure_current(&self, generation: u64) -> Result<(), SyncError> {
        if lock(&self.inner.state).generation == generation {
            Ok(())
        } else {
            Err(SyncError::Superseded { generation })
        }
    }

    /// Start a new cycle and return its generation
    pub(crate) fn begin_cycle(&self) -> u64 {
        let mut state = lock(&self.inner.state);
        state.generation += 1;
        let generation = state.generation;
        self.inner.status.send_modify(|status| {
            status.generation = generation;
        });
        generation
    }

    /// Update the status only while `generation` is still the current cycle
    pub(crate) fn update_status(&self, generation: u64, apply: impl FnOnce(&mut SyncStatus)) -> bool {
        let state = lock(&self.inner.state);
        if state.generation != generation {
            return false;
        }
        self.inner.status.send_modify(apply);
        true
    }

    /// Finish a load cycle's status update and publish its outcome
    ///
    /// `Some` replaces `last_error`. `None` clears `last_error` only when it
    /// still holds the previous load cycle's error, so errors recorded by
    /// mutations outlive a clean reload.
    pub(crate) fn finish_cycle(
        &self,
        generation: u64,
        load_error: Option<String>,
        apply: impl FnOnce(&mut SyncStatus),
    ) -> bool {
        let mut state = lock(&self.inner.state);
        if state.generation != generation {
            return false;
        }
        let previous = std::mem::replace(&mut state.load_error, load_error.clone());
        self.inner.status.send_modify(|status| {
            apply(status);
            match load_error {
                Some(message) => status.last_error = Some(message),
                None if previous.is_some() && status.last_error == previous => {
                    status.last_error = None;
                }
                None => {}
            }
        });
        true
    }

    /// Publish an error in the status and hand it back
    pub(crate) fn record_error(&self, err: SyncError) -> SyncError {
        let message = err.to_string();
        self.inner.status.send_modify(|status| {
            status.last_error = Some(message);
        });
        err
    }

    fn supersede(&self) -> u64 {
        let generation = {
            let mut state = lock(&self.inner.state);
            state.generation += 1;
            state.generation
        };
        self.inner.status.send_modify(|status| {
            status.enter(super::LoadPhase::Idle);
            status.progress = None;
            status.connected = false;
            status.generation = generation;
        });
        generation
    }
}
