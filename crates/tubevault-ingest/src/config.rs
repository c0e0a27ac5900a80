//! Ingestion configuration.

use std::path::PathBuf;
use std::str::FromStr;

use tubevault_media::QualityPreference;
use tubevault_models::KeyLayout;

use crate::error::{IngestError, IngestResult};

/// Which object store backend to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    S3,
    Local,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s3" => Ok(Self::S3),
            "local" | "fs" => Ok(Self::Local),
            other => Err(format!("unknown storage backend: {}", other)),
        }
    }
}

/// What to do when the provider has no transcript for a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranscriptPolicy {
    /// Record a warning and continue without a transcript object.
    #[default]
    Warn,
    /// Fail the whole run with `NoTranscriptAvailable`.
    Abort,
}

impl FromStr for TranscriptPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warn" | "skip" => Ok(Self::Warn),
            "abort" | "fail" => Ok(Self::Abort),
            other => Err(format!("unknown transcript policy: {}", other)),
        }
    }
}

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub storage_backend: StorageBackend,
    /// Root directory for the local backend
    pub local_storage_dir: PathBuf,
    pub key_layout: KeyLayout,
    pub quality: QualityPreference,
    /// Chunks buffered between download and upload
    pub pipe_capacity: usize,
    pub transcript_policy: TranscriptPolicy,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackend::S3,
            local_storage_dir: PathBuf::from("./storage"),
            key_layout: KeyLayout::Nested,
            quality: QualityPreference::Highest,
            pipe_capacity: 8,
            transcript_policy: TranscriptPolicy::Warn,
        }
    }
}

impl IngestConfig {
    /// Create config from environment variables.
    ///
    /// Unknown enum values are rejected; numeric settings fall back to their
    /// defaults when unparseable.
    pub fn from_env() -> IngestResult<Self> {
        let defaults = Self::default();

        Ok(Self {
            storage_backend: parse_env("STORAGE_BACKEND", defaults.storage_backend)?,
            local_storage_dir: std::env::var("LOCAL_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.local_storage_dir),
            key_layout: parse_env("VIDEO_KEY_LAYOUT", defaults.key_layout)?,
            quality: parse_env("VIDEO_QUALITY", defaults.quality)?,
            pipe_capacity: std::env::var("INGEST_PIPE_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.pipe_capacity)
                .max(1),
            transcript_policy: parse_env("TRANSCRIPT_POLICY", defaults.transcript_policy)?,
        })
    }
}

fn parse_env<T>(name: &str, default: T) -> IngestResult<T>
where
    T: FromStr<Err = String>,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .parse()
            .map_err(|e| IngestError::config_error(format!("{}: {}", name, e))),
        _ => Ok(default),
    }
}
