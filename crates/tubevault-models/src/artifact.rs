//! Stored artifact kinds and their deterministic storage keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::video::VideoIdentifier;

/// Content type for the primary media object.
pub const CONTENT_TYPE_MP4: &str = "video/mp4";

/// Content type for metadata and transcript payloads.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Kind of artifact derived from a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Video,
    Metadata,
    Transcript,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Video => "video",
            ArtifactKind::Metadata => "metadata",
            ArtifactKind::Transcript => "transcript",
        }
    }

    /// MIME type the artifact is stored with.
    pub fn content_type(&self) -> &'static str {
        match self {
            ArtifactKind::Video => CONTENT_TYPE_MP4,
            ArtifactKind::Metadata | ArtifactKind::Transcript => CONTENT_TYPE_JSON,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the primary video object lives in the key namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyLayout {
    /// `videos/<id>/<id>.mp4`, next to its metadata and transcript.
    #[default]
    Nested,
    /// `videos/full-length/<id>.mp4`, one flat folder for all videos.
    FullLength,
}

impl FromStr for KeyLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nested" => Ok(KeyLayout::Nested),
            "full-length" | "full_length" | "flat" => Ok(KeyLayout::FullLength),
            other => Err(format!("unknown key layout: {}", other)),
        }
    }
}

/// Hierarchical object key derived from a video identifier and artifact kind.
///
/// The same `(id, kind, layout)` always yields the same key, which is what
/// makes an existence check a valid deduplication test.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    /// Derive the key for one artifact of a video.
    pub fn for_artifact(id: &VideoIdentifier, kind: ArtifactKind, layout: KeyLayout) -> Self {
        let key = match (kind, layout) {
            (ArtifactKind::Video, KeyLayout::Nested) => format!("videos/{id}/{id}.mp4"),
            (ArtifactKind::Video, KeyLayout::FullLength) => format!("videos/full-length/{id}.mp4"),
            (ArtifactKind::Metadata, _) => format!("videos/{id}/metadata.json"),
            (ArtifactKind::Transcript, _) => format!("videos/{id}/transcript.json"),
        };
        Self(key)
    }

    /// Wrap a raw key (used by storage backends and tests).
    pub fn from_raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vid() -> VideoIdentifier {
        VideoIdentifier::parse("dQw4w9WgXcQ").unwrap()
    }

    #[test]
    fn test_keys_nested_layout() {
        let id = vid();
        assert_eq!(
            StorageKey::for_artifact(&id, ArtifactKind::Video, KeyLayout::Nested).as_str(),
            "videos/dQw4w9WgXcQ/dQw4w9WgXcQ.mp4"
        );
        assert_eq!(
            StorageKey::for_artifact(&id, ArtifactKind::Metadata, KeyLayout::Nested).as_str(),
            "videos/dQw4w9WgXcQ/metadata.json"
        );
        assert_eq!(
            StorageKey::for_artifact(&id, ArtifactKind::Transcript, KeyLayout::Nested).as_str(),
            "videos/dQw4w9WgXcQ/transcript.json"
        );
    }

    #[test]
    fn test_keys_full_length_layout() {
        let id = vid();
        assert_eq!(
            StorageKey::for_artifact(&id, ArtifactKind::Video, KeyLayout::FullLength).as_str(),
            "videos/full-length/dQw4w9WgXcQ.mp4"
        );
        // Auxiliary payloads do not move with the layout
        assert_eq!(
            StorageKey::for_artifact(&id, ArtifactKind::Metadata, KeyLayout::FullLength).as_str(),
            "videos/dQw4w9WgXcQ/metadata.json"
        );
    }

    #[test]
    fn test_keys_are_deterministic() {
        let a = StorageKey::for_artifact(&vid(), ArtifactKind::Video, KeyLayout::Nested);
        let b = StorageKey::for_artifact(&vid(), ArtifactKind::Video, KeyLayout::Nested);
        assert_eq!(a, b);
    }

    #[test]
    fn test_content_types() {
        assert_eq!(ArtifactKind::Video.content_type(), "video/mp4");
        assert_eq!(ArtifactKind::Metadata.content_type(), "application/json");
        assert_eq!(ArtifactKind::Transcript.content_type(), "application/json");
    }

    #[test]
    fn test_layout_from_str() {
        assert_eq!("nested".parse::<KeyLayout>().unwrap(), KeyLayout::Nested);
        assert_eq!("full-length".parse::<KeyLayout>().unwrap(), KeyLayout::FullLength);
        assert!("sideways".parse::<KeyLayout>().is_err());
    }
}
