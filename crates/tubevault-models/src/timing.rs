//! Per-run stage timings.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Named pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    MetadataCheck,
    MetadataFetch,
    MetadataUpload,
    TranscriptCheck,
    TranscriptFetch,
    TranscriptUpload,
    VideoCheck,
    /// Resolving the format and opening the remote stream
    VideoDownload,
    /// Piping the open stream into the store until commit
    VideoUpload,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::MetadataCheck => "metadataCheck",
            Stage::MetadataFetch => "metadataFetch",
            Stage::MetadataUpload => "metadataUpload",
            Stage::TranscriptCheck => "transcriptCheck",
            Stage::TranscriptFetch => "transcriptFetch",
            Stage::TranscriptUpload => "transcriptUpload",
            Stage::VideoCheck => "videoCheck",
            Stage::VideoDownload => "videoDownload",
            Stage::VideoUpload => "videoUpload",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, append-only record of how long each stage took in one run.
///
/// Built by value: each stage hands the ledger on with its entry appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimingLedger {
    entries: Vec<(Stage, Duration)>,
}

impl TimingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage timing.
    #[must_use]
    pub fn with(mut self, stage: Stage, elapsed: Duration) -> Self {
        self.entries.push((stage, elapsed));
        self
    }

    /// Entries in the order they were recorded.
    pub fn entries(&self) -> &[(Stage, Duration)] {
        &self.entries
    }

    /// Time recorded for a stage, if it ran.
    pub fn get(&self, stage: Stage) -> Option<Duration> {
        self.entries
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, d)| *d)
    }

    pub fn total(&self) -> Duration {
        self.entries.iter().map(|(_, d)| *d).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One-line `stage=123ms` summary for logs.
    pub fn summary(&self) -> String {
        self.entries
            .iter()
            .map(|(stage, d)| format!("{}={}ms", stage, d.as_millis()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
