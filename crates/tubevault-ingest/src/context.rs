//! Wiring real collaborators from the environment.

use std::sync::Arc;

use tracing::{info, warn};
use tubevault_media::{YoutubeApiConfig, YoutubeApiFetcher, YtDlpConfig, YtDlpSource};
use tubevault_storage::{LocalFsStore, ObjectStore, S3Store};

use crate::config::{IngestConfig, StorageBackend};
use crate::error::{IngestError, IngestResult};
use crate::orchestrator::Orchestrator;

/// Build the object store selected by `config`.
pub async fn build_store(config: &IngestConfig) -> IngestResult<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match config.storage_backend {
        StorageBackend::S3 => {
            let store = S3Store::from_env()
                .await
                .map_err(|e| IngestError::config_error(format!("S3 store: {}", e)))?;
            info!(bucket = %store.bucket(), "Using S3 object store");
            Arc::new(store)
        }
        StorageBackend::Local => {
            let store = LocalFsStore::new(&config.local_storage_dir)
                .await
                .map_err(|e| IngestError::config_error(format!("local store: {}", e)))?;
            info!(root = %store.root().display(), "Using local filesystem store");
            Arc::new(store)
        }
    };
    Ok(store)
}

impl Orchestrator {
    /// Create an orchestrator with every collaborator configured from the
    /// environment.
    pub async fn from_env() -> IngestResult<Self> {
        let config = IngestConfig::from_env()?;
        Self::from_config(config).await
    }

    /// Same as [`from_env`](Self::from_env) with an explicit ingest config.
    pub async fn from_config(config: IngestConfig) -> IngestResult<Self> {
        let store = build_store(&config).await?;

        let ytdlp = YtDlpConfig::from_env()
            .map_err(|e| IngestError::config_error(e.to_string()))?;
        let source = YtDlpSource::new(ytdlp)
            .map_err(|e| IngestError::config_error(format!("media source: {}", e)))?;

        let fetcher = YoutubeApiFetcher::new(YoutubeApiConfig::from_env())
            .map_err(|e| IngestError::config_error(format!("YouTube API client: {}", e)))?;
        if !fetcher.has_api_key() {
            warn!("YOUTUBE_API_KEY not set; metadata fetches will fail");
        }

        info!(
            backend = store.backend_name(),
            layout = ?config.key_layout,
            quality = %config.quality,
            transcript_policy = ?config.transcript_policy,
            "Ingest orchestrator configured"
        );

        Ok(Self::new(store, Arc::new(source), Arc::new(fetcher), config))
    }
}
