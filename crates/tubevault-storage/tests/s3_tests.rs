//! S3 integration tests.

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use tubevault_models::StorageKey;
use tubevault_storage::{ObjectStore, S3Store, MIN_PART_SIZE};

/// Test S3 connection and bucket access.
#[tokio::test]
#[ignore = "requires S3 credentials"]
async fn test_s3_connection() {
    dotenvy::dotenv().ok();

    let store = S3Store::from_env()
        .await
        .expect("Failed to create S3 store");

    store
        .check_connectivity()
        .await
        .expect("Failed to check S3 connectivity");
}

/// A key that was never written reports `false` rather than an error.
#[tokio::test]
#[ignore = "requires S3 credentials"]
async fn test_exists_for_missing_key() {
    dotenvy::dotenv().ok();

    let store = S3Store::from_env().await.expect("Failed to create S3 store");
    let key = StorageKey::from_raw(format!("test/integration/{}.mp4", uuid::Uuid::new_v4()));

    assert!(!store.exists(&key).await.expect("exists failed"));
}

/// Multipart stream upload followed by a read back.
#[tokio::test]
#[ignore = "requires S3 credentials"]
async fn test_multipart_stream_upload() {
    dotenvy::dotenv().ok();

    let store = S3Store::from_env().await.expect("Failed to create S3 store");
    let key = StorageKey::from_raw(format!("test/integration/{}.bin", uuid::Uuid::new_v4()));

    // Two full parts plus a short tail
    let chunk = Bytes::from(vec![7u8; 1024 * 1024]);
    let chunks = (2 * MIN_PART_SIZE) / chunk.len() + 1;
    let body = stream::iter((0..chunks).map(move |_| Ok(chunk.clone()))).boxed();

    let location = store
        .put_stream(&key, body, "application/octet-stream")
        .await
        .expect("Failed to upload");
    assert!(location.ends_with(key.as_str()));

    assert!(store.exists(&key).await.expect("exists failed"));
    let data = store.get(&key).await.expect("Failed to download");
    assert_eq!(data.len(), chunks * 1024 * 1024);
}

/// A failing stream never produces a visible object.
#[tokio::test]
#[ignore = "requires S3 credentials"]
async fn test_interrupted_upload_is_not_visible() {
    dotenvy::dotenv().ok();

    let store = S3Store::from_env().await.expect("Failed to create S3 store");
    let key = StorageKey::from_raw(format!("test/integration/{}.bin", uuid::Uuid::new_v4()));

    let part = Bytes::from(vec![1u8; MIN_PART_SIZE]);
    let body = stream::iter(vec![
        Ok(part),
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "source went away")),
    ])
    .boxed();

    assert!(store.put_stream(&key, body, "video/mp4").await.is_err());
    assert!(!store.exists(&key).await.expect("exists failed"));
}
