use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::KeyValueStore;
use crate::error::StoreError;

/// Key/value slot backed by a single JSON document on disk.
///
/// The document is a flat `{ "key": "value" }` object. Writes go to a sibling
/// temp file which is then renamed over the original.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_document(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw)
            .map_err(|e| StoreError::Corrupt(format!("{}: {e}", self.path.display())))
    }

    async fn write_document(&self, document: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let encoded = serde_json::to_string_pretty(document)?;
        write_atomically(&self.path.with_extension("tmp"), &self.path, encoded.as_bytes()).await?;
        debug!(path = %self.path.display(), keys = document.len(), "Storage document written");
        Ok(())
    }

    async fn update(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, String>) + Send,
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut document = match self.read_document().await {
            Ok(document) => document,
            Err(StoreError::Corrupt(reason)) => {
                warn!(%reason, "Replacing corrupt storage document");
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        apply(&mut document);
        self.write_document(&document).await
    }
}

/// Writes `contents` to `tmp` and renames it over `path`. On failure the temp
/// file is removed and `path` is left as it was.
async fn write_atomically(tmp: &Path, path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let result = async {
        let mut file = fs::File::create(tmp).await?;
        file.write_all(contents).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(tmp, path).await
    }
    .await;

    if let Err(e) = &result {
        warn!(path = %path.display(), error = %e, "Storage write failed, discarding temp file");
        let _ = fs::remove_file(tmp).await;
    }
    result
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_document().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|document| {
            document.insert(key.to_string(), value.to_string());
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(|document| {
            document.remove(key);
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path().join("storage.json"));
        assert!(store.get("@RocketShoes:cart").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn values_survive_a_new_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        FileKeyValueStore::new(&path).set("a", "1").await.unwrap();
        FileKeyValueStore::new(&path).set("b", "2").await.unwrap();

        let reopened = FileKeyValueStore::new(&path);
        assert_eq!(reopened.get("a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(reopened.get("b").await.unwrap().as_deref(), Some("2"));
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_document_is_reported_then_replaced_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();
        let store = FileKeyValueStore::new(&path);

        assert!(matches!(store.get("a").await, Err(StoreError::Corrupt(_))));

        store.set("a", "1").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn remove_deletes_only_that_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::new(dir.path().join("storage.json"));
        store.set("a", "1").await.unwrap();
        store.set("b", "2").await.unwrap();

        store.remove("a").await.unwrap();

        assert!(store.get("a").await.unwrap().is_none());
        assert_eq!(store.get("b").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn failed_rename_removes_the_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // a non-empty directory cannot be replaced by a file
        let target = dir.path().join("storage.json");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), "x").unwrap();
        let tmp = dir.path().join("storage.tmp");

        let result = write_atomically(&tmp, &target, b"{}").await;

        assert!(result.is_err());
        assert!(!tmp.exists());
        assert!(target.join("keep").exists());
    }
}
