//! Object store gateway.
//!
//! This crate provides:
//! - The [`ObjectStore`] trait: existence checks, streaming writes and reads
//! - An S3 backend using multipart uploads
//! - A local filesystem backend (write to a partial file, then rename)
//! - An in-memory backend with call counters for tests
//!
//! Every backend commits a streamed object atomically: `exists` and `get`
//! never observe an object before its upload has been fully acknowledged.

pub mod error;
pub mod local;
pub mod memory;
pub mod s3;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use local::LocalFsStore;
pub use memory::{MemoryStore, StoredObject};
pub use s3::{S3Config, S3Store, DEFAULT_PART_SIZE, MIN_PART_SIZE};
pub use store::{ByteStream, ObjectStore};
