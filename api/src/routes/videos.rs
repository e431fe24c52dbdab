//! Video endpoints (/api/upload, /api/trim, /api/videos/*)

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::AppState;
use crate::models::{StoredMedia, VideoRecord};
use crate::services::error::{LogErr, OrNotFound};
use crate::services::trim::{TrimError, TrimResult, TrimService};
use crate::services::upload::{UploadError, upload_video};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/upload", post(upload))
        .route("/api/trim", post(trim))
        .route("/api/videos", get(list_videos))
        .route("/api/videos/{id}", get(get_video))
        .route("/api/videos/{id}/views", post(count_view))
}

/// POST /api/upload - Store a recording sent as multipart field `file`
async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<StoredMedia>), StatusCode> {
    while let Some(field) = multipart
        .next_field()
        .await
        .log_status("Multipart field error", StatusCode::BAD_REQUEST)?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_default();
        let file_name = field.file_name().map(|s| s.to_string());
        let data = field
            .bytes()
            .await
            .log_status("Failed to read upload body", StatusCode::BAD_REQUEST)?;

        let stored = upload_video(
            &state.store,
            &state.storage,
            data,
            &content_type,
            file_name.as_deref(),
        )
        .await
        .map_err(|e| match e {
            UploadError::EmptyUpload => StatusCode::BAD_REQUEST,
            other => {
                tracing::error!(error = %other, "Upload failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        })?;

        return Ok((StatusCode::CREATED, Json(stored)));
    }

    tracing::warn!("Upload request without a file field");
    Err(StatusCode::BAD_REQUEST)
}

#[derive(Debug, Deserialize)]
struct TrimRequest {
    /// `/uploads/...` path or `http(s)` URL
    path: String,
    start: f64,
    end: f64,
}

/// POST /api/trim - Cut `[start, end)` out of an existing video
async fn trim(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TrimRequest>,
) -> Result<(StatusCode, Json<TrimResult>), StatusCode> {
    let service = TrimService::new(
        state.store.clone(),
        state.storage.clone(),
        state.transcoder.clone(),
    );

    let result = service
        .trim_video(&req.path, req.start, req.end)
        .await
        .map_err(|e| {
            let status = match &e {
                TrimError::InvalidRange(_) | TrimError::InvalidSource(_) => StatusCode::BAD_REQUEST,
                TrimError::InputNotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            if status.is_server_error() {
                tracing::error!(error = %e, path = %req.path, "Trim failed");
            } else {
                tracing::warn!(error = %e, path = %req.path, "Trim rejected");
            }
            status
        })?;

    Ok((StatusCode::CREATED, Json(result)))
}

/// GET /api/videos - All videos, newest first
async fn list_videos(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<VideoRecord>>, StatusCode> {
    let videos = state.store.list_videos().await.log_500("List videos error")?;
    Ok(Json(videos))
}

/// GET /api/videos/:id - Video metadata, without counting a view
async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<VideoRecord>, StatusCode> {
    state
        .store
        .get_video(&id)
        .await
        .log_500("Get video error")?
        .map(Json)
        .or_404()
}

/// POST /api/videos/:id/views - Count one view of the public page
async fn count_view(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<VideoRecord>, StatusCode> {
    state
        .store
        .increment_views(&id)
        .await
        .log_500("Increment views error")?
        .map(Json)
        .or_404()
}
