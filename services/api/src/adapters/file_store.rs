//! services/api/src/adapters/file_store.rs
//!
//! A durable `KeyValueStore` kept in a single JSON document on disk.
//! Values are stored base64-encoded so the medium stays byte-transparent.
//! The whole document is rewritten through a temporary file and a rename, and
//! the in-memory copy is only updated once that write has succeeded.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use job_board_core::{KeyValueStore, PortError, PortResult};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub struct FileKeyValueStore {
    path: PathBuf,
    entries: Mutex<Map<String, Value>>,
}

impl FileKeyValueStore {
    /// Opens the document at `path`, creating its directory if needed.
    /// A missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> PortResult<Self> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await.map_err(|e| io_error(dir, e))?;
        }
        let entries = load(&path).await?;
        info!(path = %path.display(), entries = entries.len(), "opened key/value store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    async fn persist(&self, entries: &Map<String, Value>) -> PortResult<()> {
        let bytes = serde_json::to_vec_pretty(entries)
            .map_err(|e| PortError::Unexpected(format!("could not encode store: {}", e)))?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| io_error(&self.path, e))?;
        debug!(path = %self.path.display(), entries = entries.len(), "key/value store written");
        Ok(())
    }
}

async fn load(path: &Path) -> PortResult<Map<String, Value>> {
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.is_empty() => Ok(Map::new()),
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
            PortError::Unexpected(format!("{} is not a key/value document: {}", path.display(), e))
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Map::new()),
        Err(e) => Err(io_error(path, e)),
    }
}

fn io_error(path: &Path, e: std::io::Error) -> PortError {
    PortError::Unavailable(format!("{}: {}", path.display(), e))
}

fn decode(key: &str, value: &Value) -> PortResult<Vec<u8>> {
    let encoded = value
        .as_str()
        .ok_or_else(|| PortError::Unexpected(format!("value of '{}' is not a string", key)))?;
    STANDARD
        .decode(encoded)
        .map_err(|e| PortError::Unexpected(format!("value of '{}' is not base64: {}", key, e)))
}

//=========================================================================================
// `KeyValueStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> PortResult<Option<Vec<u8>>> {
        let entries = self.entries.lock().await;
        entries.get(key).map(|value| decode(key, value)).transpose()
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> PortResult<()> {
        let mut entries = self.entries.lock().await;
        let mut next = entries.clone();
        next.insert(key.to_string(), Value::String(STANDARD.encode(value)));
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        let mut entries = self.entries.lock().await;
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.shift_remove(key);
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }

    async fn get_all_under_prefix(&self, prefix: &str) -> PortResult<Vec<(String, Vec<u8>)>> {
        let entries = self.entries.lock().await;
        entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| Ok((key.clone(), decode(key, value)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use job_board_core::{BookmarkStore, JobRecord};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn entries_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = FileKeyValueStore::open(&path).await.unwrap();
        store.set("bookmark:a", b"first".to_vec()).await.unwrap();
        store.set("bookmark:b", b"second".to_vec()).await.unwrap();
        store.set("theme", b"dark".to_vec()).await.unwrap();
        store.remove("bookmark:a").await.unwrap();
        drop(store);

        let reopened = FileKeyValueStore::open(&path).await.unwrap();
        assert_eq!(reopened.get("bookmark:a").await.unwrap(), None);
        assert_eq!(reopened.get("theme").await.unwrap(), Some(b"dark".to_vec()));
        let listed = reopened.get_all_under_prefix("bookmark:").await.unwrap();
        assert_eq!(listed, vec![("bookmark:b".to_string(), b"second".to_vec())]);
    }

    #[tokio::test]
    async fn missing_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = FileKeyValueStore::open(&path).await.unwrap();
        store.set("k", vec![1, 2, 3]).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn corrupt_document_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(FileKeyValueStore::open(&path).await.is_err());
    }

    #[tokio::test]
    async fn failed_write_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = FileKeyValueStore::open(&path).await.unwrap();
        store.set("kept", b"1".to_vec()).await.unwrap();

        // A directory where the temp file should go makes the write fail.
        std::fs::create_dir(path.with_extension("tmp")).unwrap();
        assert!(store.set("lost", b"2".to_vec()).await.is_err());
        assert_eq!(store.get("lost").await.unwrap(), None);
        assert_eq!(store.get("kept").await.unwrap(), Some(b"1".to_vec()));
    }

    #[tokio::test]
    async fn bookmarks_persist_across_store_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookmarks.json");

        let medium = Arc::new(FileKeyValueStore::open(&path).await.unwrap());
        let bookmarks = BookmarkStore::new(medium);
        let job = JobRecord::from_raw(json!({ "title": "Electrician" }), "j1".to_string());
        assert!(bookmarks.toggle(&job).await.unwrap());
        drop(bookmarks);

        let reopened = BookmarkStore::new(Arc::new(FileKeyValueStore::open(&path).await.unwrap()));
        let listed = reopened.list_all().await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].identity, "j1");
        assert_eq!(listed[0].title.as_deref(), Some("Electrician"));
        assert!(reopened.is_bookmarked("j1").await);
    }
}
