//! Video metadata payload.

use serde::{Deserialize, Serialize};

/// Snapshot of a video's descriptive metadata, stored as `metadata.json`.
///
/// `duration` holds the raw ISO-8601 string as returned upstream until the
/// orchestrator normalizes it to `MM:SS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadataRecord {
    pub title: String,
    pub description: String,
    /// Whether the uploader published captions
    pub caption_flag: bool,
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_title: Option<String>,
}
