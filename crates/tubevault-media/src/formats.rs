//! yt-dlp format listing and quality selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Subset of `yt-dlp -J` output we care about.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoInfo {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub formats: Vec<FormatInfo>,
}

/// One downloadable representation of a video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatInfo {
    pub format_id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Total bitrate in kbit/s
    #[serde(default)]
    pub tbr: Option<f64>,
    #[serde(default)]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub filesize_approx: Option<u64>,
}

impl FormatInfo {
    /// Carries both an audio and a video track.
    pub fn is_combined(&self) -> bool {
        fn has_codec(codec: &Option<String>) -> bool {
            matches!(codec.as_deref(), Some(c) if !c.is_empty() && c != "none")
        }
        has_codec(&self.vcodec) && has_codec(&self.acodec)
    }

    /// Fetchable with a single plain HTTP GET.
    pub fn is_direct_http(&self) -> bool {
        let protocol_ok = matches!(self.protocol.as_deref(), Some("https" | "http"));
        protocol_ok && self.url.as_deref().is_some_and(|u| u.starts_with("http"))
    }

    /// Size hint in bytes, exact if yt-dlp knows it.
    pub fn size_hint(&self) -> Option<u64> {
        self.filesize.or(self.filesize_approx)
    }

    fn rank(&self) -> (u32, u64, bool) {
        (
            self.height.unwrap_or(0),
            (self.tbr.unwrap_or(0.0).max(0.0) * 1000.0) as u64,
            self.ext.as_deref() == Some("mp4"),
        )
    }
}

/// Requested quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityPreference {
    #[default]
    Highest,
    Lowest,
    /// Best format no taller than this many pixels
    MaxHeight(u32),
}

impl FromStr for QualityPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        match value.as_str() {
            "highest" | "best" => Ok(Self::Highest),
            "lowest" | "worst" => Ok(Self::Lowest),
            other => other
                .trim_end_matches('p')
                .parse::<u32>()
                .map(Self::MaxHeight)
                .map_err(|_| format!("unknown video quality: {}", s)),
        }
    }
}

impl fmt::Display for QualityPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Highest => f.write_str("highest"),
            Self::Lowest => f.write_str("lowest"),
            Self::MaxHeight(h) => write!(f, "{}p", h),
        }
    }
}

/// Pick the format to stream.
///
/// Only combined audio+video formats reachable over plain HTTP qualify. A
/// `MaxHeight` request that nothing satisfies falls back to `Highest`.
pub fn select_format(
    formats: &[FormatInfo],
    preference: QualityPreference,
) -> MediaResult<FormatInfo> {
    let candidates: Vec<&FormatInfo> = formats
        .iter()
        .filter(|f| f.is_combined() && f.is_direct_http())
        .collect();

    if candidates.is_empty() {
        return Err(MediaError::no_stream(format!(
            "none of {} formats is a combined audio+video HTTP stream",
            formats.len()
        )));
    }

    let highest = || candidates.iter().copied().max_by_key(|f| f.rank());

    let chosen = match preference {
        QualityPreference::Highest => highest(),
        QualityPreference::Lowest => candidates.iter().copied().min_by_key(|f| {
            let (height, tbr, mp4) = f.rank();
            (height, tbr, !mp4)
        }),
        QualityPreference::MaxHeight(limit) => {
            let capped = candidates
                .iter()
                .copied()
                .filter(|f| f.height.is_some_and(|h| h <= limit))
                .max_by_key(|f| f.rank());
            if capped.is_none() {
                debug!(limit, "No format within height limit, falling back to highest");
            }
            capped.or_else(highest)
        }
    };

    chosen
        .cloned()
        .ok_or_else(|| MediaError::no_stream("no candidate format"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combined(id: &str, height: u32, tbr: f64, ext: &str) -> FormatInfo {
        FormatInfo {
            format_id: id.to_string(),
            url: Some(format!("https://rr1.googlevideo.com/videoplayback?itag={}", id)),
            ext: Some(ext.to_string()),
            protocol: Some("https".to_string()),
            vcodec: Some("avc1.64001F".to_string()),
            acodec: Some("mp4a.40.2".to_string()),
            height: Some(height),
            tbr: Some(tbr),
            ..Default::default()
        }
    }

    fn video_only(id: &str, height: u32) -> FormatInfo {
        FormatInfo {
            acodec: Some("none".to_string()),
            ..combined(id, height, 4000.0, "mp4")
        }
    }

    fn sample() -> Vec<FormatInfo> {
        vec![
            combined("18", 360, 500.0, "mp4"),
            combined("22", 720, 1200.0, "mp4"),
            combined("43", 720, 1200.0, "webm"),
            video_only("137", 1080),
            FormatInfo {
                protocol: Some("m3u8_native".to_string()),
                ..combined("96", 1080, 5000.0, "mp4")
            },
        ]
    }

    #[test]
    fn test_highest_prefers_height_then_mp4() {
        let chosen = select_format(&sample(), QualityPreference::Highest).unwrap();
        assert_eq!(chosen.format_id, "22");
    }

    #[test]
    fn test_lowest() {
        let chosen = select_format(&sample(), QualityPreference::Lowest).unwrap();
        assert_eq!(chosen.format_id, "18");
    }

    #[test]
    fn test_max_height_and_fallback() {
        let chosen = select_format(&sample(), QualityPreference::MaxHeight(480)).unwrap();
        assert_eq!(chosen.format_id, "18");

        // Nothing at or below 144p: deterministic fallback to highest
        let chosen = select_format(&sample(), QualityPreference::MaxHeight(144)).unwrap();
        assert_eq!(chosen.format_id, "22");
    }

    #[test]
    fn test_no_combined_format_is_no_stream() {
        let formats = vec![video_only("137", 1080), video_only("136", 720)];
        let err = select_format(&formats, QualityPreference::Highest).unwrap_err();
        assert!(matches!(err, MediaError::NoStreamAvailable(_)));

        let err = select_format(&[], QualityPreference::Lowest).unwrap_err();
        assert!(matches!(err, MediaError::NoStreamAvailable(_)));
    }

    #[test]
    fn test_quality_from_str() {
        assert_eq!("highest".parse::<QualityPreference>().unwrap(), QualityPreference::Highest);
        assert_eq!("worst".parse::<QualityPreference>().unwrap(), QualityPreference::Lowest);
        assert_eq!("720p".parse::<QualityPreference>().unwrap(), QualityPreference::MaxHeight(720));
        assert_eq!("1080".parse::<QualityPreference>().unwrap(), QualityPreference::MaxHeight(1080));
        assert!("ultra".parse::<QualityPreference>().is_err());
    }

    #[test]
    fn test_parses_ytdlp_json() {
        let json = r#"{
            "id": "dQw4w9WgXcQ",
            "title": "Rick Astley - Never Gonna Give You Up",
            "formats": [
                {"format_id": "18", "url": "https://example.com/18", "ext": "mp4",
                 "protocol": "https", "vcodec": "avc1.42001E", "acodec": "mp4a.40.2",
                 "width": 640, "height": 360, "tbr": 503.5, "filesize": 12345},
                {"format_id": "sb0", "ext": "mhtml", "protocol": "mhtml",
                 "vcodec": "none", "acodec": "none"}
            ]
        }"#;
        let info: VideoInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.formats.len(), 2);
        let chosen = select_format(&info.formats, QualityPreference::Highest).unwrap();
        assert_eq!(chosen.size_hint(), Some(12345));
    }
}
