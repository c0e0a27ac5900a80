//! Remote media source backed by yt-dlp format resolution.
//!
//! yt-dlp only lists formats (`-J`); the bytes of the chosen format are
//! streamed over HTTP so they can be piped straight into storage without
//! touching disk.

use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use tokio::process::Command;
use tracing::{debug, info, warn};
use tubevault_models::VideoIdentifier;

use crate::error::{MediaError, MediaResult};
use crate::formats::{select_format, FormatInfo, QualityPreference, VideoInfo};
use crate::progress::{track_progress, ProgressSignal};

/// Media bytes as they arrive from the remote host.
pub type MediaByteStream = BoxStream<'static, MediaResult<Bytes>>;

/// An opened, not yet consumed media download.
pub struct MediaStream {
    pub format: FormatInfo,
    /// Expected size, when the host or yt-dlp reported one
    pub total_bytes: Option<u64>,
    pub stream: MediaByteStream,
    pub progress: ProgressSignal,
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStream")
            .field("format_id", &self.format.format_id)
            .field("total_bytes", &self.total_bytes)
            .field("progress", &*self.progress.borrow())
            .finish_non_exhaustive()
    }
}

/// Opens byte streams for videos.
#[async_trait]
pub trait RemoteMediaSource: Send + Sync {
    /// Open the best combined audio+video representation for `quality`.
    ///
    /// Fails with [`MediaError::NoStreamAvailable`] when the video has no
    /// usable representation at all; never returns an empty stream instead.
    async fn open(
        &self,
        id: &VideoIdentifier,
        quality: QualityPreference,
    ) -> MediaResult<MediaStream>;
}

/// yt-dlp settings.
#[derive(Debug, Clone)]
pub struct YtDlpConfig {
    /// Binary name or path
    pub binary: String,
    /// Upper bound for one `yt-dlp -J` invocation
    pub resolve_timeout: Duration,
    pub user_agent: String,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            resolve_timeout: Duration::from_secs(60),
            user_agent: format!("tubevault/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl YtDlpConfig {
    /// Create config from environment variables.
    pub fn from_env() -> MediaResult<Self> {
        let defaults = Self::default();

        let resolve_timeout = match std::env::var("YTDLP_RESOLVE_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(raw.trim().parse().map_err(|_| {
                MediaError::config_error(format!(
                    "YTDLP_RESOLVE_TIMEOUT_SECS is not a number: {raw}"
                ))
            })?),
            Err(_) => defaults.resolve_timeout,
        };

        Ok(Self {
            binary: std::env::var("YTDLP_PATH").unwrap_or(defaults.binary),
            resolve_timeout,
            user_agent: defaults.user_agent,
        })
    }
}

/// Media source that asks yt-dlp for the format list and streams the chosen
/// format over HTTP.
#[derive(Debug, Clone)]
pub struct YtDlpSource {
    config: YtDlpConfig,
    http: reqwest::Client,
}

impl YtDlpSource {
    pub fn new(config: YtDlpConfig) -> MediaResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self { config, http })
    }

    /// List available formats with `yt-dlp -J`.
    pub async fn resolve(&self, id: &VideoIdentifier) -> MediaResult<VideoInfo> {
        let binary = which::which(&self.config.binary).map_err(|_| MediaError::YtDlpNotFound)?;
        let url = id.watch_url();
        let timeout_secs = self.config.resolve_timeout.as_secs();

        debug!(video_id = %id, binary = %binary.display(), "Resolving formats with yt-dlp");

        let output = tokio::time::timeout(
            self.config.resolve_timeout,
            Command::new(&binary)
                .args(["-J", "--no-playlist", "--no-warnings", url.as_str()])
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| MediaError::Timeout(timeout_secs))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            debug!(video_id = %id, stderr = %stderr, "yt-dlp stderr");
            return Err(classify_ytdlp_failure(id, &stderr, output.status.code()));
        }

        let info: VideoInfo = serde_json::from_slice(&output.stdout)?;
        info!(
            video_id = %id,
            formats = info.formats.len(),
            "Resolved video formats"
        );
        Ok(info)
    }

    /// Start an HTTP download of one format.
    pub async fn stream_format(&self, format: FormatInfo) -> MediaResult<MediaStream> {
        let url = format
            .url
            .clone()
            .ok_or_else(|| MediaError::no_stream(format!("format {} has no URL", format.format_id)))?;

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| MediaError::unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::unreachable(format!(
                "media host returned {} for format {}",
                status, format.format_id
            )));
        }

        let total_bytes = response
            .content_length()
            .filter(|len| *len > 0)
            .or_else(|| format.size_hint());

        let mut received: u64 = 0;
        let raw = response
            .bytes_stream()
            .map(move |item| match item {
                Ok(chunk) => {
                    received += chunk.len() as u64;
                    Ok(chunk)
                }
                Err(e) => Err(MediaError::stream_failed(e.to_string(), received)),
            })
            .boxed();

        let (stream, progress) = track_progress(raw, total_bytes);

        info!(
            format_id = %format.format_id,
            height = ?format.height,
            total_bytes = ?total_bytes,
            "Opened media stream"
        );

        Ok(MediaStream {
            format,
            total_bytes,
            stream,
            progress,
        })
    }
}

#[async_trait]
impl RemoteMediaSource for YtDlpSource {
    async fn open(
        &self,
        id: &VideoIdentifier,
        quality: QualityPreference,
    ) -> MediaResult<MediaStream> {
        let info = self.resolve(id).await?;
        let format = select_format(&info.formats, quality)?;
        debug!(
            video_id = %id,
            quality = %quality,
            format_id = %format.format_id,
            "Selected format"
        );
        self.stream_format(format).await
    }
}

/// Map a failed yt-dlp run onto the error taxonomy.
fn classify_ytdlp_failure(id: &VideoIdentifier, stderr: &str, exit_code: Option<i32>) -> MediaError {
    const GONE_MARKERS: [&str; 5] = [
        "Video unavailable",
        "Private video",
        "This video has been removed",
        "This video is not available",
        "Incomplete YouTube ID",
    ];

    if GONE_MARKERS.iter().any(|m| stderr.contains(m)) {
        return MediaError::not_found(id.as_str());
    }

    let last_line = stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("Unknown error")
        .to_string();

    if stderr.contains("429") || stderr.contains("Sign in to confirm") {
        warn!(video_id = %id, "YouTube rate limit detected");
    }

    MediaError::ytdlp_failed(
        format!("yt-dlp failed: {}", last_line),
        Some(stderr.to_string()),
        exit_code,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn id() -> VideoIdentifier {
        VideoIdentifier::parse("dQw4w9WgXcQ").unwrap()
    }

    fn format_at(url: String) -> FormatInfo {
        FormatInfo {
            format_id: "18".to_string(),
            url: Some(url),
            ext: Some("mp4".to_string()),
            protocol: Some("https".to_string()),
            vcodec: Some("avc1.42001E".to_string()),
            acodec: Some("mp4a.40.2".to_string()),
            height: Some(360),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_stream_format_yields_body_and_progress() {
        let server = MockServer::start().await;
        let body = vec![42u8; 64 * 1024];

        Mock::given(method("GET"))
            .and(path("/videoplayback"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&server)
            .await;

        let source = YtDlpSource::new(YtDlpConfig::default()).unwrap();
        let media = source
            .stream_format(format_at(format!("{}/videoplayback", server.uri())))
            .await
            .unwrap();

        assert_eq!(media.total_bytes, Some(body.len() as u64));

        let progress = media.progress.clone();
        let chunks: Vec<Bytes> = media
            .stream
            .map(|c| c.unwrap())
            .collect()
            .await;
        let received: usize = chunks.iter().map(|c| c.len()).sum();

        assert_eq!(received, body.len());
        assert_eq!(progress.borrow().percent(), 100);
    }

    #[tokio::test]
    async fn test_stream_format_http_error_is_unreachable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/videoplayback"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let source = YtDlpSource::new(YtDlpConfig::default()).unwrap();
        let err = source
            .stream_format(format_at(format!("{}/videoplayback", server.uri())))
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::SourceUnreachable(_)));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let source = YtDlpSource::new(YtDlpConfig {
            binary: "/nonexistent/bin/yt-dlp".to_string(),
            ..YtDlpConfig::default()
        })
        .unwrap();

        let err = source.open(&id(), QualityPreference::Highest).await.unwrap_err();
        assert!(matches!(err, MediaError::YtDlpNotFound));
    }

    #[test]
    fn test_classify_failures() {
        let err = classify_ytdlp_failure(
            &id(),
            "ERROR: [youtube] dQw4w9WgXcQ: Video unavailable. This video has been removed",
            Some(1),
        );
        assert!(matches!(err, MediaError::NotFound(_)));

        let err = classify_ytdlp_failure(&id(), "WARNING: x\nERROR: unable to download webpage\n", Some(1));
        match err {
            MediaError::YtDlpFailed { message, exit_code, .. } => {
                assert!(message.ends_with("ERROR: unable to download webpage"));
                assert_eq!(exit_code, Some(1));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
