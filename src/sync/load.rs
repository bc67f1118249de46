//! Two-phase load cycle
//!
//! Phase 1 streams the metadata listing page by page, adding a placeholder
//! for every path the tree does not know yet. Once the listing is complete it
//! is built into a snapshot and merged into the tree, which refreshes listed
//! leaves and drops the ones the store no longer lists. Phase 2 fetches
//! values for every listed path in concurrent batches and applies each batch
//! as it completes. Every write is tagged with the cycle's generation; once a
//! newer cycle has started, the older one stops at its next write.

use super::{LoadPhase, Progress, SyncEngine, SyncError};
use crate::remote::{MetadataEntry, MetadataPager, RemoteStore, ValueEntry};
use crate::tree::merge::merge_leaf;
use crate::tree::{Entry, Node, Tree, build_tree, path};
use chrono::{DateTime, Utc};
use futures_util::{StreamExt, stream};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of one completed load cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LoadSummary {
    pub generation: u64,
    /// Leaves listed by the store
    pub total: usize,
    /// Leaves whose value was fetched
    pub loaded: usize,
    /// Value batches that failed
    pub failed_batches: usize,
    /// Cached leaves dropped because the store no longer lists them
    pub pruned: usize,
}

impl LoadSummary {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failed_batches == 0 && self.loaded == self.total
    }
}

/// Placeholders added by a running metadata phase, and the leaves they pushed out
#[derive(Debug, Default)]
struct PhaseChanges {
    inserted: Vec<String>,
    displaced: Vec<Node>,
}

impl SyncEngine {
    /// Run one complete load cycle against the bound store
    ///
    /// # Errors
    ///
    /// - `SyncError::NotConfigured` without a bound store
    /// - `SyncError::Remote` if the metadata listing fails; the cycle is over,
    ///   the tree is back in its last settled shape and the status is `Failed`
    /// - `SyncError::Superseded` if a newer cycle started meanwhile
    ///
    /// Failed value batches do not fail the cycle; they are counted in the
    /// summary and the status.
    #[tracing::instrument(skip(self), fields(generation = tracing::field::Empty))]
    pub async fn reload(&self) -> Result<LoadSummary, SyncError> {
        let remote = self.remote()?;
        let started = Utc::now();
        let generation = self.begin_cycle();
        tracing::Span::current().record("generation", generation);

        self.update_status(generation, |status| {
            status.enter(LoadPhase::MetadataStreaming);
            status.progress = None;
        });

        let (paths, pruned) = match self.stream_metadata(&remote, generation, started).await {
            Ok(listed) => listed,
            Err(err @ SyncError::Superseded { .. }) => return Err(err),
            Err(err) => {
                self.finish_cycle(generation, Some(err.to_string()), |status| {
                    status.enter(LoadPhase::Failed);
                    status.connected = false;
                });
                warn!(error = %err, "load cycle failed");
                return Err(err);
            }
        };

        let mut summary = self.hydrate_values(&remote, generation, paths).await?;
        summary.pruned = pruned;

        let failed = summary.failed_batches;
        let load_error = (failed > 0)
            .then(|| format!("{failed} value batch(es) failed; affected parameters stay unloaded"));
        self.finish_cycle(generation, load_error, |status| {
            status.enter(LoadPhase::Settled);
            status.connected = true;
            status.last_updated = Some(Utc::now());
            status.failed_batches = failed;
        });
        info!(
            total = summary.total,
            loaded = summary.loaded,
            failed_batches = failed,
            pruned,
            "load cycle settled"
        );
        Ok(summary)
    }

    /// Phase 1; returns the listed leaf paths to hydrate and the pruned count
    async fn stream_metadata(
        &self,
        remote: &Arc<dyn RemoteStore>,
        generation: u64,
        started: DateTime<Utc>,
    ) -> Result<(Vec<String>, usize), SyncError> {
        let settings = self.settings();
        let root = path::normalize(&settings.root_path);
        let mut pager = MetadataPager::new(Arc::clone(remote), root.clone(), settings.page_size());
        let mut listed: Vec<Entry> = Vec::new();
        let mut changes = PhaseChanges::default();

        loop {
            let page = match pager.next_page().await {
                Ok(Some(page)) => page,
                Ok(None) => break,
                Err(source) => {
                    self.restore_settled(generation, changes);
                    return Err(SyncError::Remote { name: root, source });
                }
            };
            self.mutate_current(generation, |tree| {
                apply_metadata_page(tree, &page.entries, &mut changes);
            })?;
            listed.extend(page.entries.into_iter().map(Entry::from));
            self.update_status(generation, |status| status.connected = true);
        }

        let listing = build_tree(listed);
        let listed_paths = listing.leaf_paths();
        let (paths, pruned) = self.mutate_current(generation, |tree| {
            let pruned = reconcile(tree, listing, started);
            let mut paths: Vec<String> = listed_paths
                .into_iter()
                .filter(|id| tree.find(id).is_some_and(|n| n.is_leaf() && !n.is_pending))
                .collect();
            paths.sort();
            (paths, pruned)
        })?;
        debug!(
            pages = pager.pages_fetched(),
            listed = paths.len(),
            pruned,
            "metadata phase done"
        );
        Ok((paths, pruned))
    }

    /// Undo a failed metadata phase
    ///
    /// Drops the placeholders it added that nothing has touched since, then
    /// puts back every leaf a placeholder pushed out.
    fn restore_settled(&self, generation: u64, changes: PhaseChanges) {
        let result = self.mutate_current(generation, |tree| {
            for id in &changes.inserted {
                if tree
                    .find(id)
                    .is_some_and(|n| n.is_leaf() && !n.is_pending && !n.is_value_loaded)
                {
                    tree.remove(id, true);
                }
            }
            for leaf in changes.displaced {
                if tree.contains(&leaf.id) {
                    continue;
                }
                let id = leaf.id.clone();
                if let Err(err) = tree.insert_leaf(leaf) {
                    warn!(path = %id, error = %err, "could not restore displaced parameter");
                }
            }
        });
        if result.is_err() {
            debug!(generation, "skipped cleanup of superseded cycle");
        }
    }

    async fn hydrate_values(
        &self,
        remote: &Arc<dyn RemoteStore>,
        generation: u64,
        paths: Vec<String>,
    ) -> Result<LoadSummary, SyncError> {
        let total = paths.len();
        self.update_status(generation, |status| {
            status.enter(LoadPhase::ValueHydrating);
            status.progress = Some(Progress { loaded: 0, total });
        });

        let batches: Vec<Vec<String>> = paths
            .chunks(self.settings().value_batch_size())
            .map(<[String]>::to_vec)
            .collect();
        let batch_count = batches.len();

        let mut results = stream::iter(batches)
            .map(|batch| {
                let remote = Arc::clone(remote);
                async move {
                    let result = remote.get_values(&batch).await;
                    (batch, result)
                }
            })
            .buffer_unordered(self.settings().max_in_flight());

        let mut loaded = 0;
        let mut failed_batches = 0;
        while let Some((batch, result)) = results.next().await {
            match result {
                Ok(values) => {
                    self.mutate_current(generation, |tree| apply_values(tree, values))?;
                    loaded += batch.len();
                    self.update_status(generation, |status| {
                        status.progress = Some(Progress { loaded, total });
                    });
                }
                Err(err) => {
                    failed_batches += 1;
                    warn!(
                        first = batch.first().map(String::as_str).unwrap_or_default(),
                        size = batch.len(),
                        error = %err,
                        "value batch failed"
                    );
                    self.ensure_current(generation)?;
                }
            }
        }
        debug!(batches = batch_count, loaded, failed_batches, "value phase done");

        Ok(LoadSummary {
            generation,
            total,
            loaded,
            failed_batches,
            pruned: 0,
        })
    }
}

/// Apply one metadata page: add a placeholder for every path not cached yet
///
/// Cached nodes are left alone until the listing is complete. A clean leaf
/// standing where a listed path needs a folder is pushed out and recorded.
fn apply_metadata_page(tree: &mut Tree, entries: &[MetadataEntry], changes: &mut PhaseChanges) {
    for entry in entries {
        let id = path::normalize(&entry.path);
        if tree.contains(&id) {
            continue;
        }
        let placeholder = Node::placeholder(
            id.clone(),
            path::name_of(&id),
            entry.param_type,
            entry.last_modified,
        );
        match tree.insert_leaf_displacing(placeholder) {
            Ok(Some(shadowed)) => {
                if let Some(pos) = changes.inserted.iter().position(|i| *i == shadowed.id) {
                    changes.inserted.remove(pos);
                } else {
                    changes.displaced.push(shadowed);
                }
                changes.inserted.push(id);
            }
            Ok(None) => changes.inserted.push(id),
            Err(err) => warn!(path = %id, error = %err, "skipping listed parameter"),
        }
    }
}

/// Merge the complete listing into the tree; returns how many leaves were dropped
///
/// Leaves confirmed at or after `started`, by a create or save that finished
/// while the listing was streaming, are kept even when the listing missed
/// them.
fn reconcile(tree: &mut Tree, listing: Tree, started: DateTime<Utc>) -> usize {
    let before = tree.leaf_paths();
    let fresh: Vec<Node> = tree
        .leaves()
        .into_iter()
        .filter(|n| {
            !n.is_pending
                && n.last_modified.is_some_and(|at| at >= started)
                && !listing.find(&n.id).is_some_and(Node::is_leaf)
        })
        .cloned()
        .collect();

    tree.merge(listing);

    for leaf in fresh {
        if tree.contains(&leaf.id) {
            continue;
        }
        let id = leaf.id.clone();
        match tree.insert_leaf(leaf) {
            Ok(_) => debug!(path = %id, "kept parameter confirmed during the listing"),
            Err(err) => warn!(path = %id, error = %err, "could not keep fresh parameter"),
        }
    }

    before
        .iter()
        .filter(|id| !tree.find(id).is_some_and(Node::is_leaf))
        .count()
}

/// Apply one value batch, keeping dirty local values and skipping pending leaves
fn apply_values(tree: &mut Tree, values: Vec<ValueEntry>) -> usize {
    let mut applied = 0;
    for entry in values {
        let id = path::normalize(&entry.path);
        if let Some(node) = tree.find_mut(&id)
            && node.is_leaf()
            && !node.is_pending
        {
            let confirmed = Node::leaf(
                id.clone(),
                path::name_of(&id),
                Some(entry.value),
                node.param_type,
                entry.last_modified.or(node.last_modified),
            );
            merge_leaf(node, confirmed);
            applied += 1;
        }
    }
    applied
}
