//! Error types for media operations.

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors raised by the remote media source and the artifact fetcher.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The video has no combined audio+video representation we can stream.
    #[error("No stream available: {0}")]
    NoStreamAvailable(String),

    /// The identifier does not resolve to a known video.
    #[error("Video not found: {0}")]
    NotFound(String),

    #[error("No transcript available for {0}")]
    NoTranscriptAvailable(String),

    #[error("Source unreachable: {0}")]
    SourceUnreachable(String),

    #[error("Stream failed after {bytes} bytes: {message}")]
    StreamFailed { message: String, bytes: u64 },

    #[error("yt-dlp not found in PATH")]
    YtDlpNotFound,

    #[error("yt-dlp command failed: {message}")]
    YtDlpFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    pub fn no_stream(message: impl Into<String>) -> Self {
        Self::NoStreamAvailable(message.into())
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn no_transcript(id: impl Into<String>) -> Self {
        Self::NoTranscriptAvailable(id.into())
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::SourceUnreachable(message.into())
    }

    pub fn stream_failed(message: impl Into<String>, bytes: u64) -> Self {
        Self::StreamFailed {
            message: message.into(),
            bytes,
        }
    }

    pub fn ytdlp_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::YtDlpFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }
}
