//! Video ingest and stored artifact handlers.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::{info, warn};
use tubevault_models::{
    ArtifactKind, IngestOptions, ProcessVideoResult, StorageKey, VideoIdentifier,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Ingest request body. Either field may carry the video.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessVideoRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub fetch_metadata: Option<bool>,
    #[serde(default)]
    pub fetch_transcript: Option<bool>,
}

impl ProcessVideoRequest {
    fn input(&self) -> &str {
        self.video_id
            .as_deref()
            .or(self.url.as_deref())
            .unwrap_or_default()
    }

    fn options(&self) -> IngestOptions {
        let defaults = IngestOptions::default();
        IngestOptions {
            fetch_metadata: self.fetch_metadata.unwrap_or(defaults.fetch_metadata),
            fetch_transcript: self.fetch_transcript.unwrap_or(defaults.fetch_transcript),
        }
    }
}

/// Run an ingest and return the result contract.
///
/// Always 200: failures are reported in the body. If the client goes away
/// the handler future is dropped, which cancels the run.
pub async fn process_video(
    State(state): State<AppState>,
    Json(request): Json<ProcessVideoRequest>,
) -> Json<ProcessVideoResult> {
    let input = request.input();
    info!(input = %input, "Ingest requested");

    let outcome = state.orchestrator.ingest(input, request.options()).await;
    if let Some(kind) = outcome.error_kind() {
        warn!(input = %input, kind = %kind, "Ingest failed");
    }

    Json(ProcessVideoResult::from(outcome))
}

/// Stored `metadata.json` for a video.
pub async fn get_video_metadata(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<Response> {
    stored_artifact(&state, &video_id, ArtifactKind::Metadata).await
}

/// Stored `transcript.json` for a video.
pub async fn get_video_transcript(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<Response> {
    stored_artifact(&state, &video_id, ArtifactKind::Transcript).await
}

async fn stored_artifact(state: &AppState, video_id: &str, kind: ArtifactKind) -> ApiResult<Response> {
    let id = VideoIdentifier::parse(video_id).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let key = StorageKey::for_artifact(&id, kind, state.orchestrator.config().key_layout);

    let body = state.store().get(&key).await.map_err(|e| {
        if e.is_not_found() {
            return ApiError::not_found(format!("{} for {}", kind, id));
        }
        warn!(key = %key, error = %e, "Stored artifact read failed");
        if state.config.is_production() {
            ApiError::internal("storage backend unavailable")
        } else {
            ApiError::from(e)
        }
    })?;

    Ok(([(header::CONTENT_TYPE, kind.content_type())], body).into_response())
}
