//! Video identifier model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of every YouTube video identifier.
pub const VIDEO_ID_LEN: usize = 11;

/// Raised when a string is not a well-formed video identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid video identifier: {0:?}")]
pub struct InvalidIdentifier(pub String);

/// Opaque 11-character token naming a source video.
///
/// Only constructible through [`VideoIdentifier::parse`], so every value in
/// the system has already been validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VideoIdentifier(String);

impl VideoIdentifier {
    /// Validate and wrap a raw identifier.
    pub fn parse(raw: &str) -> Result<Self, InvalidIdentifier> {
        let trimmed = raw.trim();
        if trimmed.len() != VIDEO_ID_LEN || !is_valid_id_chars(trimmed) {
            return Err(InvalidIdentifier(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL for this video.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

/// Alphanumeric plus `-` and `_`.
pub(crate) fn is_valid_id_chars(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl fmt::Display for VideoIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VideoIdentifier {
    type Err = InvalidIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VideoIdentifier {
    type Error = InvalidIdentifier;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VideoIdentifier> for String {
    fn from(id: VideoIdentifier) -> Self {
        id.0
    }
}

impl AsRef<str> for VideoIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
