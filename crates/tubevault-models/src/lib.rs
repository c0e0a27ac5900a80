//! Shared data models for the TubeVault ingestion pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Validated YouTube video identifiers and URL parsing
//! - Deterministic storage keys per artifact kind
//! - Metadata and transcript payloads, with their normalization rules
//! - Ingestion outcomes and per-run stage timings

pub mod artifact;
pub mod metadata;
pub mod normalize;
pub mod outcome;
pub mod timing;
pub mod transcript;
pub mod utils;
pub mod video;

// Re-export common types
pub use artifact::{ArtifactKind, KeyLayout, StorageKey};
pub use metadata::VideoMetadataRecord;
pub use normalize::{
    decode_html_entities, format_iso8601_duration, normalize_metadata, normalize_transcript,
    normalize_transcript_text,
};
pub use outcome::{ErrorKind, IngestOptions, IngestionOutcome, ProcessVideoResult};
pub use timing::{Stage, TimingLedger};
pub use transcript::TranscriptEntry;
pub use utils::{extract_video_id, resolve_input, YoutubeIdError, YoutubeIdResult};
pub use video::{InvalidIdentifier, VideoIdentifier};
