//! Back-pressured download-to-upload pipe.
//!
//! The media stream (producer) and `ObjectStore::put_stream` (consumer) run
//! concurrently in the calling task, joined by a bounded channel. The
//! producer suspends when the channel is full and the consumer suspends when
//! it is empty, so at most `capacity` chunks are ever held in memory.
//! Dropping the returned future drops both halves.

use std::io;

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tubevault_media::{MediaStream, ProgressMilestones};
use tubevault_models::StorageKey;
use tubevault_storage::{ByteStream, ObjectStore, StorageError};

use crate::error::{IngestError, IngestResult};
use crate::logging::IngestLogger;

/// Result of a completed pipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeReport {
    pub location: String,
    pub bytes: u64,
}

enum ProducerEnd {
    Finished { bytes: u64 },
    Failed { message: String, bytes: u64 },
    ConsumerGone { bytes: u64 },
}

/// Stream `media` into `store` under `key`.
///
/// A source error is forwarded into the upload stream so the store discards
/// the partial object, and is reported as [`IngestError::SourceStream`]. A
/// store failure closes the channel, which stops the producer, and is
/// reported as [`IngestError::Upload`]. A source that ends without yielding
/// any bytes counts as a source failure.
pub async fn pipe_to_store(
    store: &dyn ObjectStore,
    key: &StorageKey,
    content_type: &str,
    media: MediaStream,
    capacity: usize,
    logger: &IngestLogger,
) -> IngestResult<PipeReport> {
    let MediaStream {
        stream: mut source,
        progress,
        ..
    } = media;

    let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(capacity.max(1));
    let body: ByteStream =
        stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) }).boxed();

    let producer = async move {
        let mut bytes: u64 = 0;
        let mut milestones = ProgressMilestones::default();

        while let Some(item) = source.next().await {
            match item {
                Ok(chunk) => {
                    if chunk.is_empty() {
                        continue;
                    }
                    bytes += chunk.len() as u64;
                    if tx.send(Ok(chunk)).await.is_err() {
                        return ProducerEnd::ConsumerGone { bytes };
                    }

                    let percent = progress.borrow().percent();
                    for milestone in milestones.advance(percent) {
                        logger.log_progress(&format!("download {}% ({} bytes)", milestone, bytes));
                    }
                }
                Err(e) => {
                    let message = e.to_string();
                    let _ = tx
                        .send(Err(io::Error::new(io::ErrorKind::Other, message.clone())))
                        .await;
                    return ProducerEnd::Failed { message, bytes };
                }
            }
        }

        if bytes == 0 {
            let message = "source produced no bytes".to_string();
            let _ = tx
                .send(Err(io::Error::new(io::ErrorKind::UnexpectedEof, message.clone())))
                .await;
            return ProducerEnd::Failed { message, bytes };
        }

        ProducerEnd::Finished { bytes }
    };

    let consumer = store.put_stream(key, body, content_type);
    let (produced, uploaded) = tokio::join!(producer, consumer);

    match (produced, uploaded) {
        (ProducerEnd::Failed { message, bytes }, _) => Err(IngestError::source_stream(message, bytes)),
        (_, Err(e)) => Err(IngestError::Upload(e)),
        (ProducerEnd::Finished { bytes }, Ok(location)) => Ok(PipeReport { location, bytes }),
        (ProducerEnd::ConsumerGone { bytes }, Ok(_)) => Err(IngestError::Upload(
            StorageError::upload_failed(format!(
                "store stopped reading after {} bytes without an error",
                bytes
            )),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tubevault_media::{track_progress, FormatInfo, MediaError};
    use tubevault_models::VideoIdentifier;
    use tubevault_storage::MemoryStore;

    fn logger() -> IngestLogger {
        IngestLogger::new(&VideoIdentifier::parse("dQw4w9WgXcQ").unwrap(), "test")
    }

    fn media(chunks: Vec<Result<Bytes, MediaError>>) -> MediaStream {
        let total = chunks
            .iter()
            .filter_map(|c| c.as_ref().ok())
            .map(|c| c.len() as u64)
            .sum::<u64>();
        let (stream, progress) = track_progress(stream::iter(chunks).boxed(), Some(total));
        MediaStream {
            format: FormatInfo::default(),
            total_bytes: Some(total),
            stream,
            progress,
        }
    }

    fn key() -> StorageKey {
        StorageKey::from_raw("videos/dQw4w9WgXcQ/dQw4w9WgXcQ.mp4")
    }

    #[tokio::test]
    async fn test_pipes_all_chunks() {
        let store = MemoryStore::new();
        let chunks = (0..20).map(|i| Ok(Bytes::from(vec![i as u8; 1000]))).collect();

        let report = pipe_to_store(&store, &key(), "video/mp4", media(chunks), 2, &logger())
            .await
            .unwrap();

        assert_eq!(report.bytes, 20_000);
        assert_eq!(report.location, "memory://videos/dQw4w9WgXcQ/dQw4w9WgXcQ.mp4");
        assert_eq!(store.object(&key()).unwrap().data.len(), 20_000);
    }

    #[tokio::test]
    async fn test_source_error_is_reported_and_nothing_committed() {
        let store = MemoryStore::new();
        let chunks = vec![
            Ok(Bytes::from_static(b"abc")),
            Err(MediaError::stream_failed("connection reset", 3)),
        ];

        let err = pipe_to_store(&store, &key(), "video/mp4", media(chunks), 4, &logger())
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::SourceStream { bytes: 3, .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_empty_source_is_a_source_failure() {
        let store = MemoryStore::new();

        let err = pipe_to_store(&store, &key(), "video/mp4", media(vec![]), 4, &logger())
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::SourceStream { bytes: 0, .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_upload_failure_stops_producer() {
        let store = MemoryStore::new();
        store.fail_puts_after(1500);
        let chunks = (0..100).map(|_| Ok(Bytes::from(vec![0u8; 1000]))).collect();

        let err = pipe_to_store(&store, &key(), "video/mp4", media(chunks), 1, &logger())
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Upload(StorageError::UploadFailed(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_pipe_commits_nothing() {
        let store = MemoryStore::new();
        let first = stream::iter(vec![Ok(Bytes::from_static(b"head"))]);
        let never = stream::pending::<Result<Bytes, MediaError>>();
        let (stream, progress) = track_progress(first.chain(never).boxed(), Some(100));
        let media = MediaStream {
            format: FormatInfo::default(),
            total_bytes: Some(100),
            stream,
            progress,
        };

        let key = key();
        let logger = logger();
        let run = pipe_to_store(&store, &key, "video/mp4", media, 1, &logger);
        assert!(tokio::time::timeout(Duration::from_millis(50), run).await.is_err());
        assert!(store.is_empty());
    }
}
