//! The object store abstraction shared by every backend.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use tubevault_models::StorageKey;

use crate::error::StorageResult;

/// Incrementally produced object body.
///
/// Item errors come from the producer side (e.g. a failing download); a
/// backend that sees one aborts the write without committing anything.
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Durable, key-addressed object storage.
///
/// Implementations must never make an object visible to [`exists`] or
/// [`get`] before [`put_stream`] has fully committed it.
///
/// [`exists`]: ObjectStore::exists
/// [`get`]: ObjectStore::get
/// [`put_stream`]: ObjectStore::put_stream
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Whether a committed object exists under `key`.
    ///
    /// A missing object is `Ok(false)`. Only genuine I/O or service failures
    /// are errors.
    async fn exists(&self, key: &StorageKey) -> StorageResult<bool>;

    /// Stream `body` into `key` and return the object's location once the
    /// write has been acknowledged.
    async fn put_stream(
        &self,
        key: &StorageKey,
        body: ByteStream,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Write a small in-memory payload.
    async fn put_bytes(
        &self,
        key: &StorageKey,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        let body = stream::once(async move { Ok(data) }).boxed();
        self.put_stream(key, body, content_type).await
    }

    /// Read a committed object in full. Missing objects are
    /// [`StorageError::NotFound`](crate::StorageError::NotFound).
    async fn get(&self, key: &StorageKey) -> StorageResult<Bytes>;

    /// Stable URI of the object stored under `key`.
    fn location(&self, key: &StorageKey) -> String;

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;

    /// Cheap round trip proving the backend is reachable.
    async fn check_connectivity(&self) -> StorageResult<()> {
        Ok(())
    }
}
