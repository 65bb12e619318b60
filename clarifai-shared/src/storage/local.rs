/// Local-disk storage backend
///
/// Writes uploads as flat files under a configured root directory. Keys
/// come from [`super::storage_key`] and contain no path separators; a
/// guard rejects any key that does, so stored paths always stay inside
/// the root.
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{FileStore, PutOutcome, Retrieved, StorageError};

/// Disk-backed file store
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Creates the store, creating the root directory if needed
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Root directory uploads are written under
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        // Keys are generated flat; anything with a separator is hostile.
        if key.contains('/') || key.contains('\\') || key.contains("..") {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl FileStore for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<PutOutcome, StorageError> {
        let path = self.resolve(key)?;
        tokio::fs::write(&path, &bytes).await?;
        debug!(key, size = bytes.len(), "Wrote upload to disk");

        Ok(PutOutcome {
            is_remote: false,
            remote_url: None,
        })
    }

    async fn get(&self, key: &str) -> Result<Retrieved, StorageError> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Retrieved::Bytes(Bytes::from(bytes))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::storage_key;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();

        let key = storage_key("report.pdf");
        let content = Bytes::from_static(b"pdf bytes here");
        store.put(&key, content.clone(), "application/pdf").await.unwrap();

        match store.get(&key).await.unwrap() {
            Retrieved::Bytes(read) => assert_eq!(read, content),
            Retrieved::Url(_) => panic!("local store must return bytes"),
        }
    }

    #[tokio::test]
    async fn test_stored_path_stays_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();

        let key = storage_key("../../etc/passwd");
        store.put(&key, Bytes::from_static(b"x"), "text/plain").await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].starts_with(dir.path()));
        assert!(entries[0].to_string_lossy().ends_with("_etcpasswd"));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();

        let err = store.get("nope.txt").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();

        let err = store.delete("gone.txt").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();

        let key = storage_key("temp.bin");
        store.put(&key, Bytes::from_static(b"data"), "application/octet-stream").await.unwrap();
        store.delete(&key).await.unwrap();

        assert!(matches!(store.get(&key).await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_hostile_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();

        let err = store
            .put("../escape", Bytes::from_static(b"x"), "text/plain")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}
