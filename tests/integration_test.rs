//! Integration tests for paramcache
//!
//! These tests drive the cache end to end through the public API, against the
//! in-memory store and against a JSON store file in a temporary directory.

use paramcache::{
    config::ParamCacheConfig,
    remote::{FileStore, MemoryStore},
    search::MatchKind,
    sync::{LoadPhase, Progress, SyncEngine, SyncError, SyncSettings},
    tree::ParameterType,
};
use std::sync::Arc;
use tempfile::TempDir;

/// Helper function to create a store holding plain-string parameters
fn seeded_store(entries: &[(&str, &str)]) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for (path, value) in entries {
        store.seed(path, value, ParameterType::PlainString);
    }
    store
}

/// Helper function to create an engine that has finished one load cycle
async fn loaded_engine(store: Arc<MemoryStore>) -> SyncEngine {
    let engine = SyncEngine::with_remote(SyncSettings::default(), store.clone());
    engine.reload().await.unwrap();
    store.reset_stats();
    engine
}

/// Helper function to create an engine over a store file
fn file_engine(dir: &TempDir) -> SyncEngine {
    let store = FileStore::new(dir.path().join("store.json"));
    SyncEngine::with_remote(SyncSettings::default(), Arc::new(store))
}

#[tokio::test]
async fn test_load_cycle_reports_progress() {
    let paths: Vec<String> = (0..23).map(|i| format!("/svc/param{i:02}")).collect();
    let entries: Vec<(&str, &str)> = paths.iter().map(|p| (p.as_str(), "v")).collect();
    let store = seeded_store(&entries);
    let engine = SyncEngine::with_remote(SyncSettings::default(), store.clone());
    let mut status = engine.subscribe();

    let summary = engine.reload().await.unwrap();

    assert!(status.has_changed().unwrap());
    let seen = status.borrow_and_update().clone();
    assert_eq!(seen.phase, LoadPhase::Settled);
    assert!(!seen.loading);
    assert!(seen.connected);
    assert!(seen.last_updated.is_some());
    assert_eq!(seen.progress, Some(Progress { loaded: 23, total: 23 }));
    assert_eq!(summary.total, 23);
    assert!(summary.is_complete());

    let tree = engine.snapshot();
    assert_eq!(tree.leaf_count(), 23);
    assert!(tree.leaves().iter().all(|n| n.is_value_loaded));
}

#[tokio::test]
async fn test_pending_add_then_confirm() {
    let store = seeded_store(&[]);
    let engine = loaded_engine(store.clone()).await;
    store.pause_writes();

    let add = tokio::spawn({
        let engine = engine.clone();
        async move { engine.add_parameter("/a/b/c", "v", ParameterType::PlainString).await }
    });
    while engine.find_node("/a/b/c").is_none() {
        tokio::task::yield_now().await;
    }

    let pending = engine.find_node("/a/b/c").unwrap();
    assert!(pending.is_pending);
    assert!(engine.find_node("/a").is_some_and(|n| n.is_folder()));
    assert!(engine.find_node("/a/b").is_some_and(|n| n.is_folder()));
    assert!(matches!(
        engine.delete_parameter("/a/b/c").await,
        Err(SyncError::Validation(_))
    ));

    store.resume_writes();
    add.await.unwrap().unwrap();

    let confirmed = engine.find_node("/a/b/c").unwrap();
    assert!(!confirmed.is_pending);
    assert!(!confirmed.is_dirty);
    assert_eq!(confirmed.server_value.as_deref(), Some("v"));
}

#[tokio::test]
async fn test_partial_folder_delete_reloads() {
    let store = seeded_store(&[
        ("/legacy/a", "1"),
        ("/legacy/b", "2"),
        ("/legacy/c", "3"),
        ("/legacy/d", "4"),
        ("/legacy/e", "5"),
        ("/keep", "k"),
    ]);
    let engine = loaded_engine(store.clone()).await;
    store.fail_delete("/legacy/b");
    store.fail_delete("/legacy/d");

    let err = engine.delete_folder("/legacy").await.unwrap_err();

    assert!(matches!(
        err,
        SyncError::PartialFolderDelete {
            failed: 2,
            total: 5,
            ..
        }
    ));
    let mut remaining = engine.snapshot().leaf_paths();
    remaining.sort();
    assert_eq!(remaining, vec!["/keep", "/legacy/b", "/legacy/d"]);
    assert!(engine.status().last_error.is_some_and(|e| e.contains("2 of 5")));
}

#[tokio::test]
async fn test_search_ranks_folders_then_leaves_then_paths() {
    let store = seeded_store(&[
        ("/db", "x"),
        ("/app/db/host", "h"),
        ("/app/db-config/x", "y"),
        ("/host", "db.internal"),
    ]);
    let engine = loaded_engine(store).await;

    let hits = engine.search("DB");
    let kinds: Vec<MatchKind> = hits.iter().map(|h| h.kind).collect();

    assert_eq!(
        kinds,
        vec![
            MatchKind::FolderExact,
            MatchKind::LeafExact,
            MatchKind::FolderPartial,
            MatchKind::Path,
            MatchKind::Path,
            MatchKind::Value,
        ]
    );
    assert_eq!(hits[0].id, "/app/db");
    assert_eq!(hits[1].id, "/db");
    assert_eq!(hits[2].id, "/app/db-config");
    assert_eq!(hits[5].id, "/host");
    assert!(hits[5].excerpt.as_deref().is_some_and(|e| e.contains("db.internal")));
}

#[tokio::test]
async fn test_file_store_round_trip() {
    let dir = TempDir::new().unwrap();

    let first = file_engine(&dir);
    let summary = first.reload().await.unwrap();
    assert_eq!(summary.total, 0);
    first
        .add_parameter("/app/db/host", "db.internal", ParameterType::PlainString)
        .await
        .unwrap();
    first
        .add_parameter("/app/db/port", "5432", ParameterType::PlainString)
        .await
        .unwrap();
    first
        .add_parameter("/app/token", "s3cr3t", ParameterType::SecureString)
        .await
        .unwrap();

    let second = file_engine(&dir);
    let summary = second.reload().await.unwrap();
    assert_eq!(summary.total, 3);
    let token = second.find_node("/app/token").unwrap();
    assert_eq!(token.param_type, Some(ParameterType::SecureString));
    assert_eq!(token.value.as_deref(), Some("s3cr3t"));

    second.edit_local_value("/app/db/port", "6543").unwrap();
    second.save("/app/db/port").await.unwrap();
    let summary = second.delete_folder("/app/db").await.unwrap();
    assert_eq!(summary.deleted, 2);

    let stored = FileStore::new(dir.path().join("store.json"))
        .load()
        .await
        .unwrap();
    assert_eq!(stored.paths(), vec!["/app/token".to_string()]);
}

#[tokio::test]
async fn test_file_store_save_is_visible_to_new_engine() {
    let dir = TempDir::new().unwrap();
    let writer = file_engine(&dir);
    writer.reload().await.unwrap();
    writer
        .add_parameter("/svc/mode", "blue", ParameterType::PlainString)
        .await
        .unwrap();
    writer.edit_local_value("/svc/mode", "green").unwrap();
    writer.save("/svc/mode").await.unwrap();

    let reader = file_engine(&dir);
    reader.reload().await.unwrap();
    let node = reader.find_node("/svc/mode").unwrap();
    assert_eq!(node.value.as_deref(), Some("green"));
    assert!(!node.is_dirty);
}

#[tokio::test]
async fn test_unbound_engine_refuses_remote_work() {
    let engine = SyncEngine::new(SyncSettings::default());
    assert!(matches!(engine.reload().await, Err(SyncError::NotConfigured)));
    assert!(matches!(engine.save("/k").await, Err(SyncError::NotConfigured)));

    let store = seeded_store(&[("/k", "v")]);
    engine.bind(store);
    engine.reload().await.unwrap();
    assert!(engine.find_node("/k").is_some());

    engine.unbind();
    assert!(engine.snapshot().is_empty());
    assert!(!engine.is_bound());
}

#[test]
fn test_config_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    let mut config = ParamCacheConfig::load_from(&path).unwrap();
    assert!(path.exists());
    config.set("sync.page_size", "20").unwrap();
    config.set("store", "/srv/params.json").unwrap();
    config.save_to(&path).unwrap();

    let reloaded = ParamCacheConfig::load_from(&path).unwrap();
    assert_eq!(reloaded, config);
    assert_eq!(reloaded.get("sync.page_size").as_deref(), Some("20"));
    assert!(config.set("sync.page_size", "500").is_err());
}
