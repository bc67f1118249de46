//! Observable sync status
//!
//! The engine publishes a [`SyncStatus`] through a `tokio::sync::watch`
//! channel; presentation layers read the latest value or wait for changes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Stage of the current load cycle
///
/// `Idle -> MetadataStreaming -> ValueHydrating -> Settled`, with `Failed`
/// reachable from `MetadataStreaming`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum LoadPhase {
    #[default]
    Idle,
    MetadataStreaming,
    ValueHydrating,
    Settled,
    Failed,
}

impl LoadPhase {
    /// Whether a cycle is running in this phase
    #[must_use]
    pub const fn is_loading(self) -> bool {
        matches!(self, Self::MetadataStreaming | Self::ValueHydrating)
    }
}

impl fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::MetadataStreaming => "loading metadata",
            Self::ValueHydrating => "loading values",
            Self::Settled => "settled",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Running value-hydration counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Progress {
    pub loaded: usize,
    pub total: usize,
}

impl Progress {
    #[must_use]
    pub const fn is_complete(self) -> bool {
        self.loaded >= self.total
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.loaded, self.total)
    }
}

/// Snapshot of the engine's state for display
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SyncStatus {
    pub loading: bool,
    pub phase: LoadPhase,
    /// Value hydration progress of the current or last cycle
    pub progress: Option<Progress>,
    /// When the last cycle settled
    pub last_updated: Option<DateTime<Utc>>,
    pub connected: bool,
    pub last_error: Option<String>,
    /// Value batches of the last cycle that failed and left leaves unloaded
    pub failed_batches: usize,
    /// Generation of the current or last cycle
    pub generation: u64,
}

impl SyncStatus {
    pub(crate) fn enter(&mut self, phase: LoadPhase) {
        self.phase = phase;
        self.loading = phase.is_loading();
    }
}
