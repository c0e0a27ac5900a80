//! Local filesystem backend.
//!
//! Objects live under a root directory at their key path. A write goes to a
//! uniquely named `*.partial` sibling which is renamed into place only after
//! it has been flushed and synced.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use tubevault_models::StorageKey;

use crate::error::{StorageError, StorageResult};
use crate::store::{ByteStream, ObjectStore};

/// Filesystem-backed object store.
#[derive(Debug, Clone)]
pub struct LocalFsStore {
    root: PathBuf,
}

impl LocalFsStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref();
        tokio::fs::create_dir_all(root).await?;
        let root = tokio::fs::canonicalize(root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key onto a path below the root, rejecting anything that could
    /// escape it.
    fn resolve(&self, key: &StorageKey) -> StorageResult<PathBuf> {
        let raw = key.as_str();
        if raw.is_empty() || raw.ends_with('/') {
            return Err(StorageError::invalid_key(raw));
        }

        let relative = Path::new(raw);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::invalid_key(raw));
        }

        Ok(self.root.join(relative))
    }
}

/// Partial file removed on drop unless it was renamed into place.
struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = std::fs::remove_file(&self.path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), error = %e, "Failed to remove partial file");
                }
            }
        }
    }
}

#[async_trait]
impl ObjectStore for LocalFsStore {
    async fn exists(&self, key: &StorageKey) -> StorageResult<bool> {
        let path = self.resolve(key)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn put_stream(
        &self,
        key: &StorageKey,
        mut body: ByteStream,
        _content_type: &str,
    ) -> StorageResult<String> {
        let path = self.resolve(key)?;
        let parent = path
            .parent()
            .ok_or_else(|| StorageError::invalid_key(key.as_str()))?;
        tokio::fs::create_dir_all(parent).await?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StorageError::invalid_key(key.as_str()))?;
        let mut partial = PartialFile {
            path: parent.join(format!(".{}.{}.partial", file_name, uuid::Uuid::new_v4())),
            committed: false,
        };

        let mut file = tokio::fs::File::create(&partial.path).await?;
        let mut total: u64 = 0;

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| StorageError::stream_failed(e.to_string()))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| StorageError::upload_failed(format!("Failed to write {}: {}", key, e)))?;
            total += chunk.len() as u64;
        }

        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&partial.path, &path).await?;
        partial.committed = true;

        info!(key = %key, size_bytes = total, path = %path.display(), "Stored object on disk");
        Ok(self.location(key))
    }

    async fn get(&self, key: &StorageKey) -> StorageResult<Bytes> {
        let path = self.resolve(key)?;
        debug!(key = %key, path = %path.display(), "Reading object from disk");
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::not_found(key.as_str()))
            }
            Err(e) => Err(StorageError::DownloadFailed(e.to_string())),
        }
    }

    fn location(&self, key: &StorageKey) -> String {
        format!("file://{}", self.root.join(key.as_str()).display())
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }

    async fn check_connectivity(&self) -> StorageResult<()> {
        let meta = tokio::fs::metadata(&self.root).await?;
        if meta.is_dir() {
            Ok(())
        } else {
            Err(StorageError::config_error(format!(
                "{} is not a directory",
                self.root.display()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn key(raw: &str) -> StorageKey {
        StorageKey::from_raw(raw)
    }

    fn chunks(parts: Vec<std::io::Result<Bytes>>) -> ByteStream {
        stream::iter(parts).boxed()
    }

    #[tokio::test]
    async fn test_missing_key_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsStore::new(dir.path()).await.unwrap();

        assert!(!store.exists(&key("videos/abc/abc.mp4")).await.unwrap());
        assert!(store
            .get(&key("videos/abc/abc.mp4"))
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_put_stream_commits_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsStore::new(dir.path()).await.unwrap();
        let k = key("videos/abc/abc.mp4");

        let location = store
            .put_stream(
                &k,
                chunks(vec![Ok(Bytes::from_static(b"hello ")), Ok(Bytes::from_static(b"world"))]),
                "video/mp4",
            )
            .await
            .unwrap();

        assert!(location.starts_with("file://"));
        assert!(location.ends_with("videos/abc/abc.mp4"));
        assert!(store.exists(&k).await.unwrap());
        assert_eq!(store.get(&k).await.unwrap(), Bytes::from_static(b"hello world"));
    }

    #[tokio::test]
    async fn test_failed_stream_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsStore::new(dir.path()).await.unwrap();
        let k = key("videos/abc/abc.mp4");

        let err = store
            .put_stream(
                &k,
                chunks(vec![
                    Ok(Bytes::from_static(b"partial")),
                    Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
                ]),
                "video/mp4",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::StreamFailed(_)));
        assert!(!store.exists(&k).await.unwrap());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("videos/abc"))
            .unwrap()
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsStore::new(dir.path()).await.unwrap();

        for raw in ["../outside.mp4", "/etc/passwd", "videos/../../x", "", "videos/"] {
            let err = store.exists(&key(raw)).await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey(_)), "{raw}");
        }
    }

    #[tokio::test]
    async fn test_put_bytes_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsStore::new(dir.path()).await.unwrap();
        let k = key("videos/abc/metadata.json");

        store.put_bytes(&k, Bytes::from_static(b"{}"), "application/json").await.unwrap();
        store
            .put_bytes(&k, Bytes::from_static(b"{\"title\":\"x\"}"), "application/json")
            .await
            .unwrap();

        assert_eq!(store.get(&k).await.unwrap(), Bytes::from_static(b"{\"title\":\"x\"}"));
    }
}
