//! Orchestrator error types.

use thiserror::Error;
use tubevault_media::MediaError;
use tubevault_models::{ArtifactKind, ErrorKind, InvalidIdentifier, YoutubeIdError};
use tubevault_storage::StorageError;

pub type IngestResult<T> = Result<T, IngestError>;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Invalid video ID: {0}")]
    InvalidIdentifier(String),

    #[error("Failed to fetch {artifact}: {source}")]
    Fetch {
        artifact: ArtifactKind,
        #[source]
        source: MediaError,
    },

    #[error("Failed to open media stream: {0}")]
    Source(#[source] MediaError),

    #[error("Existence check failed for {key}: {source}")]
    StoreCheck {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("Failed to store {key}: {source}")]
    StoreWrite {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("Source stream failed after {bytes} bytes: {message}")]
    SourceStream { message: String, bytes: u64 },

    #[error("Upload failed: {0}")]
    Upload(#[source] StorageError),

    #[error("Failed to serialize {artifact}: {source}")]
    Serialize {
        artifact: ArtifactKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl IngestError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn fetch(artifact: ArtifactKind, source: MediaError) -> Self {
        Self::Fetch { artifact, source }
    }

    pub fn store_check(key: impl Into<String>, source: StorageError) -> Self {
        Self::StoreCheck {
            key: key.into(),
            source,
        }
    }

    pub fn store_write(key: impl Into<String>, source: StorageError) -> Self {
        Self::StoreWrite {
            key: key.into(),
            source,
        }
    }

    pub fn source_stream(message: impl Into<String>, bytes: u64) -> Self {
        Self::SourceStream {
            message: message.into(),
            bytes,
        }
    }

    /// Position in the caller-facing failure taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::InvalidIdentifier(_) => ErrorKind::InvalidIdentifier,
            IngestError::Fetch { source, .. } => match media_kind(source) {
                ErrorKind::SourceStreamError => ErrorKind::FetchError,
                kind => kind,
            },
            IngestError::Source(source) => media_kind(source),
            IngestError::StoreCheck { .. }
            | IngestError::StoreWrite { .. }
            | IngestError::Serialize { .. } => ErrorKind::StoreIoError,
            IngestError::SourceStream { .. } => ErrorKind::SourceStreamError,
            IngestError::Upload(_) => ErrorKind::UploadError,
            IngestError::ConfigError(_) => ErrorKind::ConfigError,
        }
    }
}

fn media_kind(error: &MediaError) -> ErrorKind {
    match error {
        MediaError::NoStreamAvailable(_) => ErrorKind::NoStreamAvailable,
        MediaError::NotFound(_) => ErrorKind::NotFound,
        MediaError::NoTranscriptAvailable(_) => ErrorKind::NoTranscriptAvailable,
        MediaError::ConfigError(_) | MediaError::YtDlpNotFound => ErrorKind::ConfigError,
        _ => ErrorKind::SourceStreamError,
    }
}

impl From<InvalidIdentifier> for IngestError {
    fn from(err: InvalidIdentifier) -> Self {
        Self::InvalidIdentifier(err.0)
    }
}

impl From<YoutubeIdError> for IngestError {
    fn from(err: YoutubeIdError) -> Self {
        Self::InvalidIdentifier(err.to_string())
    }
}
