//! Optimistic mutations
//!
//! Each mutation changes the tree first, then calls the remote store, then
//! confirms or rolls back. The tree lock is never held while the remote call
//! is outstanding.

use super::{SyncEngine, SyncError};
use crate::tree::{Node, ParameterType, path};
use futures_util::{StreamExt, stream};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of a folder delete where every leaf was deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderDeleteSummary {
    pub folder: String,
    pub deleted: usize,
}

impl SyncEngine {
    /// Create a parameter
    ///
    /// The leaf shows up in the tree as pending right away, with any missing
    /// folders. It stops being pending once the store confirms, and is removed
    /// again if the store refuses.
    ///
    /// # Errors
    ///
    /// - `SyncError::Validation` for an empty name, a path already taken, or a
    ///   leaf where a folder would be needed
    /// - `SyncError::NotConfigured` without a bound store
    /// - `SyncError::Remote` if the store refuses the write
    pub async fn add_parameter(
        &self,
        path: &str,
        value: &str,
        param_type: ParameterType,
    ) -> Result<(), SyncError> {
        let id = path::normalize(path);
        let name = path::name_of(&id).to_string();
        if let Err(err) = validate_new_path(&id) {
            return Err(self.record_error(err));
        }
        let remote = self.remote().map_err(|e| self.record_error(e))?;

        let inserted = self.mutate(|tree| {
            if tree.contains(&id) {
                return Err(SyncError::Validation(format!("{id} already exists")));
            }
            tree.insert_leaf(Node::pending(id.clone(), name.clone(), value.to_string(), param_type))
                .map_err(|e| SyncError::Validation(e.to_string()))
        });
        if let Err(err) = inserted {
            return Err(self.record_error(err));
        }
        debug!(%id, "optimistic add");

        match remote.put_value(&id, value, param_type.is_secure()).await {
            Ok(at) => {
                self.mutate(|tree| {
                    if let Some(node) = tree.find_mut(&id)
                        && node.is_pending
                    {
                        node.is_pending = false;
                        node.server_value = Some(value.to_string());
                        node.is_value_loaded = true;
                        node.last_modified = Some(at);
                        node.refresh_dirty();
                    }
                });
                info!(%id, "parameter created");
                Ok(())
            }
            Err(source) => {
                self.mutate(|tree| {
                    if tree.find(&id).is_some_and(|n| n.is_pending) {
                        tree.remove(&id, true);
                    }
                });
                warn!(%id, error = %source, "create failed, rolled back");
                Err(self.record_error(SyncError::Remote { name, source }))
            }
        }
    }

    /// Write a leaf's local value to the store
    ///
    /// # Errors
    ///
    /// - `SyncError::NotFound` for an unknown id
    /// - `SyncError::Validation` for a folder, a pending leaf, or a leaf
    ///   without a value
    /// - `SyncError::NotConfigured` without a bound store
    /// - `SyncError::Remote` if the store refuses the write; the tree is left
    ///   as it was
    pub async fn save(&self, id: &str) -> Result<(), SyncError> {
        let id = path::normalize(id);
        let remote = self.remote().map_err(|e| self.record_error(e))?;
        let (name, value, is_secure) = match saveable(&self.snapshot(), &id) {
            Ok(found) => found,
            Err(err) => return Err(self.record_error(err)),
        };

        match remote.put_value(&id, &value, is_secure).await {
            Ok(at) => {
                let still_dirty = self.mutate(|tree| {
                    let node = tree.find_mut(&id).filter(|n| n.is_leaf())?;
                    node.server_value = Some(value.clone());
                    node.is_value_loaded = true;
                    node.last_modified = Some(at);
                    node.refresh_dirty();
                    Some(node.is_dirty)
                });
                info!(%id, edited_in_flight = still_dirty.unwrap_or_default(), "parameter saved");
                Ok(())
            }
            Err(source) => {
                warn!(%id, error = %source, "save failed");
                Err(self.record_error(SyncError::Remote { name, source }))
            }
        }
    }

    /// Delete a single parameter
    ///
    /// The leaf disappears right away, together with folders left empty, and
    /// is put back if the store refuses the delete.
    ///
    /// # Errors
    ///
    /// - `SyncError::NotFound` for an unknown id
    /// - `SyncError::Validation` for a folder or a pending leaf
    /// - `SyncError::NotConfigured` without a bound store
    /// - `SyncError::Remote` if the store refuses the delete
    pub async fn delete_parameter(&self, path: &str) -> Result<(), SyncError> {
        let id = path::normalize(path);
        let remote = self.remote().map_err(|e| self.record_error(e))?;

        let removed = self.mutate(|tree| {
            let node = tree
                .find(&id)
                .ok_or_else(|| SyncError::NotFound(id.clone()))?;
            if node.is_folder() {
                return Err(SyncError::Validation(format!(
                    "{id} is a folder; delete it as a folder"
                )));
            }
            if node.is_pending {
                return Err(SyncError::Validation(format!("{id} is still being created")));
            }
            tree.remove(&id, true)
                .ok_or_else(|| SyncError::NotFound(id.clone()))
        });
        let removed = match removed {
            Ok(node) => node,
            Err(err) => return Err(self.record_error(err)),
        };
        debug!(%id, "optimistic delete");

        match remote.delete_value(&id).await {
            Ok(()) => {
                info!(%id, "parameter deleted");
                Ok(())
            }
            Err(source) => {
                let name = removed.name.clone();
                self.mutate(|tree| {
                    if tree.contains(&id) {
                        return;
                    }
                    if let Err(err) = tree.insert_leaf(removed) {
                        warn!(%id, error = %err, "could not restore parameter");
                    }
                });
                warn!(%id, error = %source, "delete failed, restored");
                Err(self.record_error(SyncError::Remote { name, source }))
            }
        }
    }

    /// Delete a folder and every parameter below it
    ///
    /// The subtree disappears right away and the leaf deletes run
    /// concurrently. If any of them fail nothing is put back locally; a full
    /// reload brings the tree in line with the store instead.
    ///
    /// # Errors
    ///
    /// - `SyncError::NotFound` for an unknown id
    /// - `SyncError::Validation` for a leaf
    /// - `SyncError::NotConfigured` without a bound store
    /// - `SyncError::PartialFolderDelete` with the number of failed deletes
    pub async fn delete_folder(&self, folder_id: &str) -> Result<FolderDeleteSummary, SyncError> {
        let id = path::normalize(folder_id);
        let remote = self.remote().map_err(|e| self.record_error(e))?;

        let leaves = self.mutate(|tree| {
            let node = tree
                .find(&id)
                .ok_or_else(|| SyncError::NotFound(id.clone()))?;
            if node.is_leaf() {
                return Err(SyncError::Validation(format!("{id} is not a folder")));
            }
            let mut leaves = Vec::new();
            node.collect_leaf_paths(&mut leaves);
            tree.remove(&id, true);
            Ok(leaves)
        });
        let leaves = match leaves {
            Ok(leaves) => leaves,
            Err(err) => return Err(self.record_error(err)),
        };
        let total = leaves.len();
        debug!(%id, total, "optimistic folder delete");

        let failed: Vec<String> = stream::iter(leaves)
            .map(|leaf| {
                let remote = Arc::clone(&remote);
                async move {
                    let result = remote.delete_value(&leaf).await;
                    (leaf, result)
                }
            })
            .buffer_unordered(self.settings().max_in_flight())
            .filter_map(|(leaf, result)| async move {
                result
                    .err()
                    .map(|err| {
                        warn!(path = %leaf, error = %err, "leaf delete failed");
                        leaf
                    })
            })
            .collect()
            .await;

        if failed.is_empty() {
            info!(%id, deleted = total, "folder deleted");
            return Ok(FolderDeleteSummary {
                folder: id,
                deleted: total,
            });
        }

        warn!(%id, failed = failed.len(), total, "folder delete incomplete, reloading");
        if let Err(err) = self.reload().await {
            warn!(error = %err, "reload after folder delete failed");
        }
        Err(self.record_error(SyncError::PartialFolderDelete {
            folder: id,
            failed: failed.len(),
            total,
        }))
    }
}

fn validate_new_path(id: &str) -> Result<(), SyncError> {
    let segments = path::segments(id);
    if segments.is_empty() {
        return Err(SyncError::Validation(
            "parameter name must not be empty".to_string(),
        ));
    }
    if segments.iter().any(|s| *s == "." || *s == "..") {
        return Err(SyncError::Validation(format!(
            "{id}: '.' and '..' are not valid path segments"
        )));
    }
    if segments.iter().any(|s| s.trim().is_empty()) {
        return Err(SyncError::Validation(format!("{id}: blank path segment")));
    }
    Ok(())
}

fn saveable(tree: &crate::tree::Tree, id: &str) -> Result<(String, String, bool), SyncError> {
    let node = tree
        .find(id)
        .ok_or_else(|| SyncError::NotFound(id.to_string()))?;
    if node.is_folder() {
        return Err(SyncError::Validation(format!("{id} is a folder")));
    }
    if node.is_pending {
        return Err(SyncError::Validation(format!("{id} is still being created")));
    }
    let value = node
        .value
        .clone()
        .ok_or_else(|| SyncError::Validation(format!("{id} has no value to save")))?;
    let is_secure = node.param_type.is_some_and(ParameterType::is_secure);
    Ok((node.name.clone(), value, is_secure))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteStore;
    use crate::sync::{SyncSettings, SyncStatus};
    use crate::testing::{assert_sorted, engine_with};

    #[tokio::test]
    async fn test_add_shows_pending_node_immediately() {
        let (engine, store) = engine_with(&[]).await;
        store.pause_writes();

        let add = tokio::spawn({
            let engine = engine.clone();
            async move { engine.add_parameter("/a/b/c", "v", ParameterType::PlainString).await }
        });
        while engine.find_node("/a/b/c").is_none() {
            tokio::task::yield_now().await;
        }

        let snapshot = engine.snapshot();
        assert!(snapshot.find("/a").is_some_and(Node::is_folder));
        assert!(snapshot.find("/a/b").is_some_and(Node::is_folder));
        let leaf = snapshot.find("/a/b/c").unwrap();
        assert!(leaf.is_pending);
        assert!(leaf.is_dirty);
        assert!(leaf.server_value.is_none());

        store.resume_writes();
        add.await.unwrap().unwrap();

        let leaf = engine.find_node("/a/b/c").unwrap();
        assert!(!leaf.is_pending);
        assert!(!leaf.is_dirty);
        assert!(leaf.is_value_loaded);
        assert_eq!(leaf.server_value.as_deref(), Some("v"));
        assert!(leaf.last_modified.is_some());
        assert!(store.catalog().contains("/a/b/c"));
    }

    #[tokio::test]
    async fn test_add_failure_rolls_back_exactly() {
        let (engine, store) = engine_with(&[("/x", "1")]).await;
        let before = engine.snapshot();
        store.fail_put("/a/b/c");

        let err = engine
            .add_parameter("/a/b/c", "v", ParameterType::PlainString)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Remote { ref name, .. } if name == "c"));
        assert_eq!(*engine.snapshot(), *before);
        assert!(engine.status().last_error.is_some_and(|e| e.starts_with("c:")));
    }

    #[tokio::test]
    async fn test_add_validation() {
        let (engine, _store) = engine_with(&[("/a/b", "1")]).await;

        for bad in ["", "/", "/x/../y", "/a/b", "/a/b/c", "/a"] {
            let err = engine
                .add_parameter(bad, "v", ParameterType::PlainString)
                .await
                .unwrap_err();
            assert!(matches!(err, SyncError::Validation(_)), "{bad}: {err}");
        }
        assert_eq!(engine.snapshot().leaf_count(), 1);
    }

    #[tokio::test]
    async fn test_add_without_remote() {
        let engine = SyncEngine::new(SyncSettings::default());
        let err = engine
            .add_parameter("/k", "v", ParameterType::PlainString)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::NotConfigured));
        assert!(engine.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_add_secure_parameter() {
        let (engine, store) = engine_with(&[]).await;
        engine
            .add_parameter("/app/secret", "s3cr3t", ParameterType::SecureString)
            .await
            .unwrap();
        let stored = store.catalog();
        assert_eq!(
            stored.get("/app/secret").map(|p| p.param_type),
            Some(ParameterType::SecureString)
        );
        assert_sorted(&engine.snapshot());
    }

    #[tokio::test]
    async fn test_save_clears_dirty() {
        let (engine, store) = engine_with(&[("/app/key", "old")]).await;
        engine.edit_local_value("/app/key", "new").unwrap();

        engine.save("/app/key").await.unwrap();

        let node = engine.find_node("/app/key").unwrap();
        assert!(!node.is_dirty);
        assert_eq!(node.server_value.as_deref(), Some("new"));
        assert_eq!(store.catalog().get("/app/key").map(|p| p.value.as_str()), Some("new"));
    }

    #[tokio::test]
    async fn test_save_failure_keeps_local_edit() {
        let (engine, store) = engine_with(&[("/app/key", "old")]).await;
        engine.edit_local_value("/app/key", "new").unwrap();
        store.fail_put("/app/key");

        let err = engine.save("/app/key").await.unwrap_err();

        assert!(matches!(err, SyncError::Remote { ref name, .. } if name == "key"));
        let node = engine.find_node("/app/key").unwrap();
        assert!(node.is_dirty);
        assert_eq!(node.value.as_deref(), Some("new"));
        assert_eq!(node.server_value.as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_save_rejects_folder() {
        let (engine, _store) = engine_with(&[("/app/key", "v")]).await;
        let err = engine.save("/app").await.unwrap_err();
        assert!(matches!(err, SyncError::Validation(_)));
        let err = engine.save("/missing").await.unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_parameter_collapses_folders() {
        let (engine, store) = engine_with(&[("/a/b/c", "1"), ("/x", "2")]).await;

        engine.delete_parameter("/a/b/c").await.unwrap();

        assert!(engine.find_node("/a").is_none());
        assert!(!store.catalog().contains("/a/b/c"));
    }

    #[tokio::test]
    async fn test_delete_failure_restores_exactly() {
        let (engine, store) = engine_with(&[("/a/b/c", "1"), ("/a/d", "2")]).await;
        let before = engine.snapshot();
        store.fail_delete("/a/b/c");

        let err = engine.delete_parameter("/a/b/c").await.unwrap_err();

        assert!(matches!(err, SyncError::Remote { ref name, .. } if name == "c"));
        assert_eq!(*engine.snapshot(), *before);
        assert_sorted(&engine.snapshot());
    }

    #[tokio::test]
    async fn test_delete_parameter_rejects_folder() {
        let (engine, store) = engine_with(&[("/a/b", "1")]).await;
        let err = engine.delete_parameter("/a").await.unwrap_err();
        assert!(matches!(err, SyncError::Validation(_)));
        assert!(engine.find_node("/a/b").is_some());
        assert!(store.stats().deletes.is_empty());
    }

    #[tokio::test]
    async fn test_delete_folder_removes_subtree() {
        let (engine, store) = engine_with(&[("/app/a", "1"), ("/app/sub/b", "2"), ("/keep", "3")]).await;

        let summary = engine.delete_folder("/app").await.unwrap();

        assert_eq!(summary.deleted, 2);
        assert!(engine.find_node("/app").is_none());
        assert_eq!(store.catalog().paths(), vec!["/keep".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_folder_partial_failure_reloads() {
        let paths = ["/app/k1", "/app/k2", "/app/k3", "/app/k4", "/app/k5"];
        let (engine, store) = engine_with(&paths.map(|p| (p, "v"))).await;
        store.fail_delete("/app/k2");
        store.fail_delete("/app/k4");

        let err = engine.delete_folder("/app").await.unwrap_err();

        assert!(matches!(
            err,
            SyncError::PartialFolderDelete { failed: 2, total: 5, .. }
        ));
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.leaf_paths(), vec!["/app/k2", "/app/k4"]);
        assert!(snapshot.leaves().iter().all(|n| n.is_value_loaded));
        let status: SyncStatus = engine.status();
        assert!(status.last_error.is_some_and(|e| e.contains("2 of 5")));
    }

    #[tokio::test]
    async fn test_delete_folder_rejects_leaf() {
        let (engine, _store) = engine_with(&[("/k", "v")]).await;
        let err = engine.delete_folder("/k").await.unwrap_err();
        assert!(matches!(err, SyncError::Validation(_)));
    }

    #[tokio::test]
    async fn test_store_still_sees_unconfirmed_add_as_absent() {
        let (engine, store) = engine_with(&[]).await;
        store.fail_put("/k");
        let _ = engine.add_parameter("/k", "v", ParameterType::PlainString).await;
        assert!(store.get_values(&["/k".to_string()]).await.unwrap().is_empty());
        assert!(engine.find_node("/k").is_none());
    }
}
