//! Structured ingest logging utilities.

use tracing::{error, info, warn, Span};
use tubevault_models::VideoIdentifier;

/// Logger carrying the video id and operation on every event.
#[derive(Debug, Clone)]
pub struct IngestLogger {
    video_id: String,
    operation: String,
}

impl IngestLogger {
    pub fn new(video_id: &VideoIdentifier, operation: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            operation = %self.operation,
            "Ingest started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            operation = %self.operation,
            "Ingest progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            video_id = %self.video_id,
            operation = %self.operation,
            "Ingest warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            video_id = %self.video_id,
            operation = %self.operation,
            "Ingest error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            video_id = %self.video_id,
            operation = %self.operation,
            "Ingest completed: {}", message
        );
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span wrapping one whole run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "ingest",
            video_id = %self.video_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_fields() {
        let id = VideoIdentifier::parse("dQw4w9WgXcQ").unwrap();
        let logger = IngestLogger::new(&id, "ingest");

        assert_eq!(logger.video_id(), "dQw4w9WgXcQ");
        assert_eq!(logger.operation(), "ingest");
    }
}
