//! Auxiliary artifact fetching (metadata and transcripts).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, info, warn};
use tubevault_models::{TranscriptEntry, VideoIdentifier, VideoMetadataRecord};

use crate::error::{MediaError, MediaResult};
use crate::metadata::{record_from_response, VideoListResponse};
use crate::transcript::parse_timed_text;

const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
const DEFAULT_TIMEDTEXT_URL: &str = "https://www.youtube.com/api/timedtext";

/// Fetches the structured side artifacts of a video.
#[async_trait]
pub trait AuxiliaryArtifactFetcher: Send + Sync {
    /// Descriptive metadata. Unknown ids fail with [`MediaError::NotFound`].
    async fn fetch_metadata(&self, id: &VideoIdentifier) -> MediaResult<VideoMetadataRecord>;

    /// Timed-text cues in chronological order. Videos without captions fail
    /// with [`MediaError::NoTranscriptAvailable`].
    async fn fetch_transcript(&self, id: &VideoIdentifier) -> MediaResult<Vec<TranscriptEntry>>;
}

/// YouTube API settings.
#[derive(Debug, Clone)]
pub struct YoutubeApiConfig {
    /// Data API key; only needed for metadata
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub timedtext_url: String,
    pub transcript_lang: String,
    pub request_timeout: Duration,
}

impl Default for YoutubeApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timedtext_url: DEFAULT_TIMEDTEXT_URL.to_string(),
            transcript_lang: "en".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl YoutubeApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("YOUTUBE_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            api_base_url: std::env::var("YOUTUBE_API_BASE_URL").unwrap_or(defaults.api_base_url),
            timedtext_url: std::env::var("YOUTUBE_TIMEDTEXT_URL").unwrap_or(defaults.timedtext_url),
            transcript_lang: std::env::var("YOUTUBE_TRANSCRIPT_LANG")
                .unwrap_or(defaults.transcript_lang),
            request_timeout: defaults.request_timeout,
        }
    }
}

/// Fetcher backed by the YouTube Data API v3 and the timed-text endpoint.
#[derive(Debug, Clone)]
pub struct YoutubeApiFetcher {
    config: YoutubeApiConfig,
    http: reqwest::Client,
}

impl YoutubeApiFetcher {
    pub fn new(config: YoutubeApiConfig) -> MediaResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { config, http })
    }

    pub fn has_api_key(&self) -> bool {
        self.config.api_key.is_some()
    }
}

#[async_trait]
impl AuxiliaryArtifactFetcher for YoutubeApiFetcher {
    async fn fetch_metadata(&self, id: &VideoIdentifier) -> MediaResult<VideoMetadataRecord> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| MediaError::config_error("YOUTUBE_API_KEY not set"))?;

        let url = format!("{}/videos", self.config.api_base_url.trim_end_matches('/'));
        debug!(video_id = %id, "Fetching video metadata");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("part", "snippet,contentDetails"),
                ("id", id.as_str()),
                ("key", api_key),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(MediaError::not_found(id.as_str()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::invalid_response(format!(
                "YouTube API returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let list: VideoListResponse = response.json().await?;
        let record = record_from_response(id, list)?;

        info!(video_id = %id, title = %record.title, "Fetched video metadata");
        Ok(record)
    }

    async fn fetch_transcript(&self, id: &VideoIdentifier) -> MediaResult<Vec<TranscriptEntry>> {
        debug!(video_id = %id, lang = %self.config.transcript_lang, "Fetching transcript");

        let response = self
            .http
            .get(&self.config.timedtext_url)
            .query(&[
                ("lang", self.config.transcript_lang.as_str()),
                ("v", id.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(MediaError::no_transcript(id.as_str()));
        }
        if !status.is_success() {
            return Err(MediaError::invalid_response(format!(
                "timed-text endpoint returned {}",
                status
            )));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(MediaError::no_transcript(id.as_str()));
        }

        let entries = match parse_timed_text(&body) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(video_id = %id, error = %e, "Unreadable timed-text document");
                return Err(MediaError::no_transcript(id.as_str()));
            }
        };
        if entries.is_empty() {
            return Err(MediaError::no_transcript(id.as_str()));
        }

        info!(video_id = %id, entries = entries.len(), "Fetched transcript");
        Ok(entries)
    }
}
