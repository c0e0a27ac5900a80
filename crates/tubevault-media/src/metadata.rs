//! YouTube Data API v3 `videos.list` response mapping.

use serde::Deserialize;
use tubevault_models::{VideoIdentifier, VideoMetadataRecord};

use crate::error::{MediaError, MediaResult};

#[derive(Debug, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    pub snippet: Snippet,
    #[serde(default)]
    pub content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub channel_title: Option<String>,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
pub struct Thumbnails {
    pub default: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub high: Option<Thumbnail>,
    pub standard: Option<Thumbnail>,
    pub maxres: Option<Thumbnail>,
}

impl Thumbnails {
    /// Largest thumbnail available.
    pub fn best(&self) -> Option<&Thumbnail> {
        self.maxres
            .as_ref()
            .or(self.standard.as_ref())
            .or(self.high.as_ref())
            .or(self.medium.as_ref())
            .or(self.default.as_ref())
    }
}

#[derive(Debug, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContentDetails {
    /// ISO-8601 duration, e.g. `PT3M33S`
    #[serde(default)]
    pub duration: String,
    /// `"true"` when captions were published
    #[serde(default)]
    pub caption: Option<String>,
}

/// Build a metadata record from a `videos.list` response.
///
/// An empty item list means the id is unknown to YouTube. The duration is
/// passed through untouched.
pub fn record_from_response(
    id: &VideoIdentifier,
    response: VideoListResponse,
) -> MediaResult<VideoMetadataRecord> {
    let item = response
        .items
        .into_iter()
        .next()
        .ok_or_else(|| MediaError::not_found(id.as_str()))?;

    let details = item.content_details.unwrap_or_default();

    Ok(VideoMetadataRecord {
        thumbnail_url: item.snippet.thumbnails.best().map(|t| t.url.clone()),
        title: item.snippet.title,
        description: item.snippet.description,
        caption_flag: details.caption.as_deref() == Some("true"),
        duration: details.duration,
        channel_title: item.snippet.channel_title,
    })
}
