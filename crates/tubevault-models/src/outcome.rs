//! Ingestion request options and terminal outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which auxiliary artifacts to fetch alongside the video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOptions {
    #[serde(default = "default_true")]
    pub fetch_metadata: bool,
    #[serde(default = "default_true")]
    pub fetch_transcript: bool,
}

fn default_true() -> bool {
    true
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            fetch_metadata: true,
            fetch_transcript: true,
        }
    }
}

impl IngestOptions {
    /// Only the video, no auxiliary artifacts.
    pub fn video_only() -> Self {
        Self {
            fetch_metadata: false,
            fetch_transcript: false,
        }
    }
}

/// Failure taxonomy surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidIdentifier,
    NotFound,
    NoTranscriptAvailable,
    NoStreamAvailable,
    #[serde(rename = "StoreIOError")]
    StoreIoError,
    SourceStreamError,
    /// A metadata or transcript API call failed outright (HTTP status, quota,
    /// unparseable body).
    FetchError,
    UploadError,
    ConfigError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidIdentifier => "InvalidIdentifier",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::NoTranscriptAvailable => "NoTranscriptAvailable",
            ErrorKind::NoStreamAvailable => "NoStreamAvailable",
            ErrorKind::StoreIoError => "StoreIOError",
            ErrorKind::SourceStreamError => "SourceStreamError",
            ErrorKind::FetchError => "FetchError",
            ErrorKind::UploadError => "UploadError",
            ErrorKind::ConfigError => "ConfigError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of one ingestion run.
///
/// Either `location` is set (success) or `error` and `message` are set
/// (failure). Fields are private so no other shape can be built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionOutcome {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl IngestionOutcome {
    pub fn succeeded(location: impl Into<String>) -> Self {
        Self {
            success: true,
            location: Some(location.into()),
            error: None,
            message: None,
        }
    }

    pub fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            location: None,
            error: Some(kind),
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// Result contract handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessVideoResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&IngestionOutcome> for ProcessVideoResult {
    fn from(outcome: &IngestionOutcome) -> Self {
        Self {
            success: outcome.success,
            file_path: outcome.location.clone(),
            error: outcome.message.clone(),
        }
    }
}

impl From<IngestionOutcome> for ProcessVideoResult {
    fn from(outcome: IngestionOutcome) -> Self {
        Self {
            success: outcome.success,
            file_path: outcome.location,
            error: outcome.message,
        }
    }
}
