//! The ingestion pipeline.
//!
//! One run walks the requested auxiliary artifacts (metadata, then
//! transcript) and finally the video itself. Every artifact is guarded by an
//! existence check on its deterministic key, so a repeated run for the same
//! video fetches and uploads nothing. Nothing is rolled back on failure: the
//! next run's existence checks pick up whatever was already committed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, warn, Instrument};
use tubevault_media::{AuxiliaryArtifactFetcher, MediaError, RemoteMediaSource};
use tubevault_models::{
    normalize_metadata, normalize_transcript, resolve_input, ArtifactKind, IngestOptions,
    IngestionOutcome, Stage, StorageKey, TimingLedger, VideoIdentifier,
};
use tubevault_storage::ObjectStore;

use crate::config::{IngestConfig, TranscriptPolicy};
use crate::error::{IngestError, IngestResult};
use crate::logging::IngestLogger;
use crate::metrics;
use crate::pipe::pipe_to_store;

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub outcome: IngestionOutcome,
    pub timings: TimingLedger,
    /// Non-fatal conditions, e.g. a video without captions
    pub warnings: Vec<String>,
}

/// Ingestion pipeline over injected collaborators.
#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<dyn ObjectStore>,
    source: Arc<dyn RemoteMediaSource>,
    fetcher: Arc<dyn AuxiliaryArtifactFetcher>,
    config: IngestConfig,
}

/// Mutable state of one run.
#[derive(Default)]
struct Run {
    timings: TimingLedger,
    warnings: Vec<String>,
}

impl Run {
    fn record(&mut self, stage: Stage, elapsed: Duration) {
        self.timings = std::mem::take(&mut self.timings).with(stage, elapsed);
    }
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        source: Arc<dyn RemoteMediaSource>,
        fetcher: Arc<dyn AuxiliaryArtifactFetcher>,
        config: IngestConfig,
    ) -> Self {
        Self {
            store,
            source,
            fetcher,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingest a video given as a bare identifier or any supported URL.
    pub async fn ingest(&self, input: &str, options: IngestOptions) -> IngestionOutcome {
        self.ingest_report(input, options).await.outcome
    }

    /// Like [`ingest`](Self::ingest), also returning stage timings and
    /// warnings.
    ///
    /// Input that does not resolve to a valid identifier is rejected before
    /// any collaborator is called.
    pub async fn ingest_report(&self, input: &str, options: IngestOptions) -> IngestReport {
        let id = match resolve_input(input) {
            Ok(id) => id,
            Err(e) => {
                let err = IngestError::from(e);
                warn!(input = %input, "Rejected ingest input: {}", err);
                let outcome = IngestionOutcome::failed(err.kind(), err.to_string());
                metrics::record_outcome(&outcome);
                return IngestReport {
                    outcome,
                    timings: TimingLedger::new(),
                    warnings: Vec::new(),
                };
            }
        };

        let logger = IngestLogger::new(&id, "ingest");
        let span = logger.create_span();
        self.run(&id, options, &logger).instrument(span).await
    }

    async fn run(
        &self,
        id: &VideoIdentifier,
        options: IngestOptions,
        logger: &IngestLogger,
    ) -> IngestReport {
        logger.log_start(&format!(
            "metadata={} transcript={} backend={}",
            options.fetch_metadata,
            options.fetch_transcript,
            self.store.backend_name()
        ));

        let mut run = Run::default();
        let outcome = match self.execute(id, options, logger, &mut run).await {
            Ok(location) => {
                logger.log_completion(&location);
                IngestionOutcome::succeeded(location)
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                IngestionOutcome::failed(e.kind(), e.to_string())
            }
        };

        info!(
            video_id = %id,
            total_ms = run.timings.total().as_millis() as u64,
            "Stage timings: {}",
            run.timings.summary()
        );
        metrics::record_outcome(&outcome);
        metrics::record_timings(&run.timings);

        IngestReport {
            outcome,
            timings: run.timings,
            warnings: run.warnings,
        }
    }

    async fn execute(
        &self,
        id: &VideoIdentifier,
        options: IngestOptions,
        logger: &IngestLogger,
        run: &mut Run,
    ) -> IngestResult<String> {
        if options.fetch_metadata {
            self.ensure_metadata(id, logger, run).await?;
        }
        if options.fetch_transcript {
            self.ensure_transcript(id, logger, run).await?;
        }
        self.ensure_video(id, logger, run).await
    }

    async fn ensure_metadata(
        &self,
        id: &VideoIdentifier,
        logger: &IngestLogger,
        run: &mut Run,
    ) -> IngestResult<()> {
        let kind = ArtifactKind::Metadata;
        let key = self.key(id, kind);

        if self.check_exists(&key, Stage::MetadataCheck, run).await? {
            self.skip_existing(kind, &key, logger);
            run.record(Stage::MetadataFetch, Duration::ZERO);
            return Ok(());
        }

        let started = Instant::now();
        let fetched = self.fetcher.fetch_metadata(id).await;
        run.record(Stage::MetadataFetch, started.elapsed());

        let record = normalize_metadata(fetched.map_err(|e| IngestError::fetch(kind, e))?);
        self.upload_json(&key, kind, &record, Stage::MetadataUpload, run)
            .await
    }

    async fn ensure_transcript(
        &self,
        id: &VideoIdentifier,
        logger: &IngestLogger,
        run: &mut Run,
    ) -> IngestResult<()> {
        let kind = ArtifactKind::Transcript;
        let key = self.key(id, kind);

        if self.check_exists(&key, Stage::TranscriptCheck, run).await? {
            self.skip_existing(kind, &key, logger);
            run.record(Stage::TranscriptFetch, Duration::ZERO);
            return Ok(());
        }

        let started = Instant::now();
        let fetched = self.fetcher.fetch_transcript(id).await;
        run.record(Stage::TranscriptFetch, started.elapsed());

        let entries = match fetched {
            Ok(entries) => entries,
            Err(MediaError::NoTranscriptAvailable(_))
                if self.config.transcript_policy == TranscriptPolicy::Warn =>
            {
                let message = format!("no transcript available for {}", id);
                logger.log_warning(&message);
                metrics::record_warning(kind);
                run.warnings.push(message);
                return Ok(());
            }
            Err(e) => return Err(IngestError::fetch(kind, e)),
        };

        let entries = normalize_transcript(entries);
        self.upload_json(&key, kind, &entries, Stage::TranscriptUpload, run)
            .await
    }

    async fn ensure_video(
        &self,
        id: &VideoIdentifier,
        logger: &IngestLogger,
        run: &mut Run,
    ) -> IngestResult<String> {
        let kind = ArtifactKind::Video;
        let key = self.key(id, kind);

        // Must run before the source is opened: a stored video is never
        // downloaded again.
        if self.check_exists(&key, Stage::VideoCheck, run).await? {
            self.skip_existing(kind, &key, logger);
            return Ok(self.store.location(&key));
        }

        let started = Instant::now();
        let opened = self.source.open(id, self.config.quality).await;
        run.record(Stage::VideoDownload, started.elapsed());
        let media = opened.map_err(IngestError::Source)?;

        logger.log_progress(&format!(
            "streaming format {} ({}) to {}",
            media.format.format_id,
            media
                .total_bytes
                .map(|b| format!("{} bytes", b))
                .unwrap_or_else(|| "unknown size".to_string()),
            key
        ));

        let started = Instant::now();
        let piped = pipe_to_store(
            self.store.as_ref(),
            &key,
            kind.content_type(),
            media,
            self.config.pipe_capacity,
            logger,
        )
        .await;
        run.record(Stage::VideoUpload, started.elapsed());

        let report = piped?;
        metrics::record_bytes_streamed(report.bytes);
        info!(
            video_id = %id,
            key = %key,
            bytes = report.bytes,
            "Video stored"
        );
        Ok(report.location)
    }

    fn key(&self, id: &VideoIdentifier, kind: ArtifactKind) -> StorageKey {
        StorageKey::for_artifact(id, kind, self.config.key_layout)
    }

    async fn check_exists(&self, key: &StorageKey, stage: Stage, run: &mut Run) -> IngestResult<bool> {
        let started = Instant::now();
        let exists = self.store.exists(key).await;
        run.record(stage, started.elapsed());
        exists.map_err(|e| IngestError::store_check(key.as_str(), e))
    }

    fn skip_existing(&self, kind: ArtifactKind, key: &StorageKey, logger: &IngestLogger) {
        metrics::record_dedup_hit(kind);
        logger.log_progress(&format!("{} already stored at {}, skipping", kind, key));
    }

    async fn upload_json<T: Serialize + ?Sized>(
        &self,
        key: &StorageKey,
        kind: ArtifactKind,
        payload: &T,
        stage: Stage,
        run: &mut Run,
    ) -> IngestResult<()> {
        let body = serde_json::to_vec_pretty(payload)
            .map_err(|source| IngestError::Serialize { artifact: kind, source })?;

        let started = Instant::now();
        let stored = self
            .store
            .put_bytes(key, Bytes::from(body), kind.content_type())
            .await;
        run.record(stage, started.elapsed());

        let location = stored.map_err(|e| IngestError::store_write(key.as_str(), e))?;
        debug!(key = %key, location = %location, "Stored {}", kind);
        Ok(())
    }
}
