//! JSON-file-backed remote store
//!
//! Keeps the whole [`Catalog`] in one JSON document. Every call reads the file,
//! and writes replace it through a temporary file so a crash never leaves a
//! half-written store. A missing file is an empty store.

use super::{Catalog, MetadataPage, RemoteError, RemoteStore, ValueEntry};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// Remote store persisted as a JSON file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored catalog
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the file cannot be read or parsed.
    pub async fn load(&self) -> Result<Catalog, RemoteError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Catalog::default()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                RemoteError::new(format!("Failed to parse {}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Catalog::default()),
            Err(e) => Err(RemoteError::new(format!(
                "Failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn save(&self, catalog: &Catalog) -> Result<(), RemoteError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                RemoteError::new(format!("Failed to create store directory: {e}"))
            })?;
        }

        let json = serde_json::to_string_pretty(catalog)
            .map_err(|e| RemoteError::new(format!("Failed to serialize store: {e}")))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| RemoteError::new(format!("Failed to write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            RemoteError::new(format!("Failed to replace {}: {e}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), parameters = catalog.len(), "store saved");
        Ok(())
    }

    async fn update<T>(
        &self,
        apply: impl FnOnce(&mut Catalog) -> Result<T, RemoteError> + Send,
    ) -> Result<T, RemoteError> {
        let _guard = self.write_lock.lock().await;
        let mut catalog = self.load().await?;
        let out = apply(&mut catalog)?;
        self.save(&catalog).await?;
        Ok(out)
    }
}

#[async_trait]
impl RemoteStore for FileStore {
    async fn list_metadata_page(
        &self,
        path_prefix: &str,
        page_size: usize,
        continuation: Option<String>,
    ) -> Result<MetadataPage, RemoteError> {
        let catalog = self.load().await?;
        Ok(catalog.list_page(path_prefix, page_size, continuation.as_deref()))
    }

    async fn get_values(&self, paths: &[String]) -> Result<Vec<ValueEntry>, RemoteError> {
        self.load().await?.values(paths)
    }

    async fn put_value(
        &self,
        path: &str,
        value: &str,
        is_secure: bool,
    ) -> Result<DateTime<Utc>, RemoteError> {
        self.update(|catalog| Ok(catalog.put(path, value, is_secure)))
            .await
    }

    async fn delete_value(&self, path: &str) -> Result<(), RemoteError> {
        self.update(|catalog| catalog.delete(path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("absent.json"));
        let page = store.list_metadata_page("/", 50, None).await.unwrap();
        assert!(page.entries.is_empty());
    }

    #[tokio::test]
    async fn test_writes_persist_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = FileStore::new(&path);
        store.put_value("/app/key", "v1", false).await.unwrap();
        store.put_value("/app/secret", "s", true).await.unwrap();
        store.delete_value("/app/key").await.unwrap();

        let reopened = FileStore::new(&path);
        let catalog = reopened.load().await.unwrap();
        assert_eq!(catalog.paths(), vec!["/app/secret".to_string()]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = FileStore::new(&path);
        let err = store.get_values(&["/a".into()]).await.unwrap_err();
        assert!(err.message().contains("Failed to parse"));
    }
}
