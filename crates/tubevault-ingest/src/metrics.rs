//! Ingest metrics.
//!
//! Recorded through the `metrics` facade; a binary decides whether a
//! recorder (e.g. Prometheus) is installed.

use metrics::{counter, histogram};
use tubevault_models::{ArtifactKind, IngestionOutcome, TimingLedger};

/// Metric names as constants for consistency.
pub mod names {
    pub const INGEST_RUNS_TOTAL: &str = "tubevault_ingest_runs_total";
    pub const INGEST_STAGE_DURATION_SECONDS: &str = "tubevault_ingest_stage_duration_seconds";
    pub const INGEST_BYTES_STREAMED_TOTAL: &str = "tubevault_ingest_bytes_streamed_total";
    pub const INGEST_DEDUP_HITS_TOTAL: &str = "tubevault_ingest_dedup_hits_total";
    pub const INGEST_WARNINGS_TOTAL: &str = "tubevault_ingest_warnings_total";
}

/// Count one finished run by outcome and error kind.
pub fn record_outcome(outcome: &IngestionOutcome) {
    let result = if outcome.is_success() { "success" } else { "failure" };
    let kind = outcome
        .error_kind()
        .map(|k| k.as_str())
        .unwrap_or("none");

    let labels = [("result", result.to_string()), ("kind", kind.to_string())];
    counter!(names::INGEST_RUNS_TOTAL, &labels).increment(1);
}

/// Feed every stage of a run into the stage histogram.
pub fn record_timings(timings: &TimingLedger) {
    for (stage, elapsed) in timings.entries() {
        let labels = [("stage", stage.as_str().to_string())];
        histogram!(names::INGEST_STAGE_DURATION_SECONDS, &labels).record(elapsed.as_secs_f64());
    }
}

pub fn record_bytes_streamed(bytes: u64) {
    counter!(names::INGEST_BYTES_STREAMED_TOTAL).increment(bytes);
}

/// An artifact was already stored and its fetch was skipped.
pub fn record_dedup_hit(kind: ArtifactKind) {
    let labels = [("artifact", kind.as_str().to_string())];
    counter!(names::INGEST_DEDUP_HITS_TOTAL, &labels).increment(1);
}

pub fn record_warning(kind: ArtifactKind) {
    let labels = [("artifact", kind.as_str().to_string())];
    counter!(names::INGEST_WARNINGS_TOTAL, &labels).increment(1);
}
