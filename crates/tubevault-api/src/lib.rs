//! Axum HTTP API server.
//!
//! This crate provides:
//! - `POST /api/videos` to run an ingest and return the result contract
//! - Read access to stored metadata and transcript payloads
//! - Health and readiness probes
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
