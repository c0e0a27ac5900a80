//! YouTube URL parsing.
//!
//! Turns whatever the user pasted (a watch URL, a short link, an embed URL or
//! a bare identifier) into a validated [`VideoIdentifier`].

use thiserror::Error;

use crate::video::{is_valid_id_chars, VideoIdentifier, VIDEO_ID_LEN};

/// Errors that can occur during YouTube ID extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum YoutubeIdError {
    /// URL is not a valid YouTube URL
    #[error("URL is not a valid YouTube URL")]
    InvalidYoutubeUrl,
    /// Video ID has invalid format
    #[error("Video ID has invalid format")]
    InvalidVideoId,
    /// Video ID not found in URL
    #[error("Video ID not found in URL")]
    VideoIdNotFound,
}

/// Result type for YouTube ID extraction.
pub type YoutubeIdResult<T> = Result<T, YoutubeIdError>;

/// Path prefixes that are directly followed by the identifier, in priority order.
const PATH_MARKERS: [&str; 4] = ["youtu.be/", "/embed/", "/v/", "/shorts/"];

/// Extract the video identifier from a YouTube URL.
///
/// Supports:
/// - https://youtube.com/watch?v=VIDEO_ID (and `&v=` later in the query)
/// - https://youtu.be/VIDEO_ID
/// - https://youtube.com/embed/VIDEO_ID
/// - https://youtube.com/v/VIDEO_ID
/// - https://youtube.com/shorts/VIDEO_ID
pub fn extract_video_id(url: &str) -> YoutubeIdResult<VideoIdentifier> {
    let url = url.trim();

    if !is_youtube_domain(url) {
        return Err(YoutubeIdError::InvalidYoutubeUrl);
    }

    if let Some(id) = extract_from_watch_url(url) {
        return validate_youtube_id(id);
    }

    for marker in PATH_MARKERS {
        if let Some(id) = segment_after(url, marker) {
            return validate_youtube_id(id);
        }
    }

    Err(YoutubeIdError::VideoIdNotFound)
}

/// Accept either a bare identifier or any supported URL.
pub fn resolve_input(input: &str) -> YoutubeIdResult<VideoIdentifier> {
    match VideoIdentifier::parse(input) {
        Ok(id) => Ok(id),
        Err(_) if is_youtube_domain(input) => extract_video_id(input),
        Err(_) => Err(YoutubeIdError::InvalidVideoId),
    }
}

fn is_youtube_domain(url: &str) -> bool {
    let url = url.to_ascii_lowercase();
    url.contains("youtube.com") || url.contains("youtu.be")
}

fn extract_from_watch_url(url: &str) -> Option<&str> {
    let start = url.find("?v=").or_else(|| url.find("&v="))? + 3;
    Some(id_segment(&url[start..]))
}

fn segment_after<'a>(url: &'a str, marker: &str) -> Option<&'a str> {
    let start = url.find(marker)? + marker.len();
    if start >= url.len() {
        return None;
    }
    Some(id_segment(&url[start..]))
}

/// Cut a path/query remainder at the first delimiter.
fn id_segment(segment: &str) -> &str {
    let end = segment
        .find(['&', '#', '?', '/'])
        .unwrap_or(segment.len());
    segment[..end].trim()
}

fn validate_youtube_id(id: &str) -> YoutubeIdResult<VideoIdentifier> {
    if id.len() != VIDEO_ID_LEN || !is_valid_id_chars(id) {
        return Err(YoutubeIdError::InvalidVideoId);
    }
    VideoIdentifier::parse(id).map_err(|_| YoutubeIdError::InvalidVideoId)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(url: &str) -> String {
        extract_video_id(url).unwrap().to_string()
    }

    #[test]
    fn test_extract_video_id_success_cases() {
        assert_eq!(id("https://youtube.com/watch?v=dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(id("https://youtu.be/dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(id("https://youtube.com/embed/dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(id("https://youtube.com/v/dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(id("https://youtube.com/shorts/dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(
            id("https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ"),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            id("https://youtube.com/watch?v=dQw4w9WgXcQ&list=PLrAXtmRdnEQy4qtr"),
            "dQw4w9WgXcQ"
        );
        assert_eq!(id("https://youtu.be/dQw4w9WgXcQ?t=30"), "dQw4w9WgXcQ");
        assert_eq!(id("  https://YOUTUBE.COM/watch?v=dQw4w9WgXcQ  "), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_extract_video_id_error_cases() {
        assert_eq!(
            extract_video_id("https://example.com"),
            Err(YoutubeIdError::InvalidYoutubeUrl)
        );
        assert_eq!(
            extract_video_id("https://youtube.com"),
            Err(YoutubeIdError::VideoIdNotFound)
        );
        assert_eq!(
            extract_video_id("https://youtu.be/"),
            Err(YoutubeIdError::VideoIdNotFound)
        );
        assert_eq!(
            extract_video_id("https://youtube.com/watch?v=abc123"),
            Err(YoutubeIdError::InvalidVideoId)
        );
        assert_eq!(
            extract_video_id("https://youtu.be/abc123def456789"),
            Err(YoutubeIdError::InvalidVideoId)
        );
        assert_eq!(
            extract_video_id("https://youtube.com/watch?v=abc123def!!"),
            Err(YoutubeIdError::InvalidVideoId)
        );
        assert_eq!(
            extract_video_id("https://youtube.com/watch?v="),
            Err(YoutubeIdError::InvalidVideoId)
        );
    }

    #[test]
    fn test_resolve_input() {
        assert_eq!(resolve_input("dQw4w9WgXcQ").unwrap().as_str(), "dQw4w9WgXcQ");
        assert_eq!(
            resolve_input("https://youtu.be/dQw4w9WgXcQ").unwrap().as_str(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(resolve_input("not a video"), Err(YoutubeIdError::InvalidVideoId));
    }
}
