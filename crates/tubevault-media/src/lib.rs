//! Remote collaborators of the ingestion pipeline.
//!
//! This crate provides:
//! - [`RemoteMediaSource`]: opens a progress-reporting byte stream for a video,
//!   implemented by [`YtDlpSource`] (yt-dlp format resolution + HTTP streaming)
//! - [`AuxiliaryArtifactFetcher`]: metadata and timed-text transcripts,
//!   implemented by [`YoutubeApiFetcher`] (YouTube Data API v3)
//! - Format selection and transfer progress helpers

pub mod error;
pub mod fetcher;
pub mod formats;
pub mod metadata;
pub mod progress;
pub mod source;
pub mod transcript;

pub use error::{MediaError, MediaResult};
pub use fetcher::{AuxiliaryArtifactFetcher, YoutubeApiConfig, YoutubeApiFetcher};
pub use formats::{select_format, FormatInfo, QualityPreference, VideoInfo};
pub use progress::{track_progress, ProgressMilestones, ProgressSignal, TransferProgress};
pub use source::{MediaByteStream, MediaStream, RemoteMediaSource, YtDlpConfig, YtDlpSource};
pub use transcript::parse_timed_text;
