//! Timed-text transcript entries.

use serde::{Deserialize, Serialize};

/// One caption cue. A transcript is a chronologically ordered `Vec` of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub text: String,
    /// Start of the cue, in seconds from the beginning of the video
    pub offset: f64,
    /// Cue length in seconds
    pub duration: f64,
}

impl TranscriptEntry {
    pub fn new(text: impl Into<String>, offset: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            offset,
            duration,
        }
    }
}
