//! Ingestion orchestrator.
//!
//! Turns a video identifier into a stored, deduplicated set of artifacts:
//! metadata and transcript JSON payloads, then the video itself streamed
//! straight from the remote source into the object store.

pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod pipe;

pub use config::{IngestConfig, StorageBackend, TranscriptPolicy};
pub use error::{IngestError, IngestResult};
pub use logging::IngestLogger;
pub use orchestrator::{IngestReport, Orchestrator};
pub use pipe::{pipe_to_store, PipeReport};
