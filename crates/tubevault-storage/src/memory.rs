//! In-memory backend.
//!
//! Streams are staged in a private buffer and committed into the shared map
//! in one step at end of stream. Call counters and failure injection make it
//! the store of choice for pipeline tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use tracing::debug;
use tubevault_models::StorageKey;

use crate::error::{StorageError, StorageResult};
use crate::store::{ByteStream, ObjectStore};

/// A committed object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

/// Object store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<String, StoredObject>>,
    exists_calls: AtomicUsize,
    put_calls: AtomicUsize,
    get_calls: AtomicUsize,
    exists_failure: Mutex<Option<String>>,
    get_failure: Mutex<Option<String>>,
    put_failure_after: Mutex<Option<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object directly, bypassing counters.
    pub fn insert(&self, key: &StorageKey, data: impl Into<Bytes>, content_type: &str) {
        let object = StoredObject {
            data: data.into(),
            content_type: content_type.to_string(),
        };
        self.write_objects().insert(key.as_str().to_string(), object);
    }

    /// Snapshot of a committed object.
    pub fn object(&self, key: &StorageKey) -> Option<StoredObject> {
        self.read_objects().get(key.as_str()).cloned()
    }

    /// Committed keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.read_objects().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.read_objects().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn exists_calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn reset_counters(&self) {
        self.exists_calls.store(0, Ordering::SeqCst);
        self.put_calls.store(0, Ordering::SeqCst);
        self.get_calls.store(0, Ordering::SeqCst);
    }

    /// Make every subsequent `exists` call fail with an I/O error.
    pub fn fail_exists_with(&self, message: impl Into<String>) {
        *lock(&self.exists_failure) = Some(message.into());
    }

    /// Make every subsequent `get` call fail with an I/O error.
    pub fn fail_gets_with(&self, message: impl Into<String>) {
        *lock(&self.get_failure) = Some(message.into());
    }

    /// Make `put_stream` fail once more than `bytes` have been staged.
    pub fn fail_puts_after(&self, bytes: usize) {
        *lock(&self.put_failure_after) = Some(bytes);
    }

    pub fn clear_failures(&self) {
        *lock(&self.exists_failure) = None;
        *lock(&self.get_failure) = None;
        *lock(&self.put_failure_after) = None;
    }

    fn read_objects(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, StoredObject>> {
        self.objects.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_objects(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, StoredObject>> {
        self.objects.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn exists(&self, key: &StorageKey) -> StorageResult<bool> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = lock(&self.exists_failure).clone() {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                message,
            )));
        }

        Ok(self.read_objects().contains_key(key.as_str()))
    }

    async fn put_stream(
        &self,
        key: &StorageKey,
        mut body: ByteStream,
        content_type: &str,
    ) -> StorageResult<String> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        let fail_after = *lock(&self.put_failure_after);

        let mut staged = BytesMut::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| StorageError::stream_failed(e.to_string()))?;
            staged.extend_from_slice(&chunk);

            if let Some(limit) = fail_after {
                if staged.len() > limit {
                    return Err(StorageError::upload_failed(format!(
                        "injected failure after {} bytes",
                        staged.len()
                    )));
                }
            }
        }

        debug!(key = %key, size_bytes = staged.len(), "Committing object in memory");
        let object = StoredObject {
            data: staged.freeze(),
            content_type: content_type.to_string(),
        };
        self.write_objects().insert(key.as_str().to_string(), object);

        Ok(self.location(key))
    }

    async fn get(&self, key: &StorageKey) -> StorageResult<Bytes> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = lock(&self.get_failure).clone() {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                message,
            )));
        }

        self.read_objects()
            .get(key.as_str())
            .map(|o| o.data.clone())
            .ok_or_else(|| StorageError::not_found(key.as_str()))
    }

    fn location(&self, key: &StorageKey) -> String {
        format!("memory://{}", key)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::time::Duration;

    fn key(raw: &str) -> StorageKey {
        StorageKey::from_raw(raw)
    }

    #[tokio::test]
    async fn test_never_written_key_does_not_exist() {
        let store = MemoryStore::new();
        assert!(!store.exists(&key("videos/x/x.mp4")).await.unwrap());
        assert_eq!(store.exists_calls(), 1);
    }

    #[tokio::test]
    async fn test_staged_bytes_invisible_until_end_of_stream() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let k = key("videos/x/x.mp4");
        let (tx, rx) = tokio::sync::mpsc::channel::<std::io::Result<Bytes>>(1);
        let body = stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|c| (c, rx)) }).boxed();

        let writer = {
            let store = store.clone();
            let k = k.clone();
            tokio::spawn(async move { store.put_stream(&k, body, "video/mp4").await })
        };

        tx.send(Ok(Bytes::from_static(b"first half"))).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!store.exists(&k).await.unwrap());

        tx.send(Ok(Bytes::from_static(b" second half"))).await.unwrap();
        drop(tx);
        writer.await.unwrap().unwrap();

        assert!(store.exists(&k).await.unwrap());
        assert_eq!(
            store.object(&k).unwrap().data,
            Bytes::from_static(b"first half second half")
        );
    }

    #[tokio::test]
    async fn test_stream_error_commits_nothing() {
        let store = MemoryStore::new();
        let k = key("videos/x/x.mp4");
        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"abc")),
            Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "cut")),
        ])
        .boxed();

        let err = store.put_stream(&k, body, "video/mp4").await.unwrap_err();
        assert!(matches!(err, StorageError::StreamFailed(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MemoryStore::new();
        let k = key("videos/x/x.mp4");

        store.fail_puts_after(2);
        let err = store
            .put_bytes(&k, Bytes::from_static(b"abcdef"), "video/mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UploadFailed(_)));
        assert!(store.object(&k).is_none());

        store.fail_exists_with("connection refused");
        assert!(matches!(store.exists(&k).await, Err(StorageError::Io(_))));

        store.fail_gets_with("connection reset");
        assert!(matches!(store.get(&k).await, Err(StorageError::Io(_))));

        store.clear_failures();
        assert!(!store.exists(&k).await.unwrap());
        assert!(store.get(&k).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_get_and_location() {
        let store = MemoryStore::new();
        let k = key("videos/x/transcript.json");
        store.insert(&k, Bytes::from_static(b"[]"), "application/json");

        assert_eq!(store.get(&k).await.unwrap(), Bytes::from_static(b"[]"));
        assert_eq!(store.get_calls(), 1);
        assert_eq!(store.location(&k), "memory://videos/x/transcript.json");
        assert!(store.get(&key("videos/y/transcript.json")).await.unwrap_err().is_not_found());
    }
}
