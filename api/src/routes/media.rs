//! Local media serving (/uploads/*)

use axum::{
    Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use std::sync::Arc;

use crate::AppState;
use crate::constants::MEDIA_CACHE_CONTROL;
use crate::services::error::LogErr;
use crate::storage::content_type_for;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/uploads/{*path}", get(serve_upload))
}

/// GET /uploads/*path - Serve media written to the local uploads dir
async fn serve_upload(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    if path.contains("..") || path.contains('\0') {
        return Err(StatusCode::FORBIDDEN);
    }

    let uploads_dir = state.storage.uploads_dir();
    let full_path = uploads_dir.join(&path);

    // Missing files are expected, stay quiet
    let canonical = full_path
        .canonicalize()
        .map_err(|_| StatusCode::NOT_FOUND)?;
    let uploads_canonical = uploads_dir
        .canonicalize()
        .log_500("Failed to canonicalize uploads dir")?;

    if !canonical.starts_with(&uploads_canonical) {
        return Err(StatusCode::FORBIDDEN);
    }

    let bytes = tokio::fs::read(&canonical)
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&canonical)),
            (header::CACHE_CONTROL, MEDIA_CACHE_CONTROL),
        ],
        bytes,
    ))
}

#[cfg(test)]
mod tests {
    use crate::{AppState, app, storage::MediaStorage, store::VideoStore, transcode::Transcoder};
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_serves_uploaded_file() {
        let dir = tempfile::tempdir().unwrap();
        let public = dir.path().join("public");
        std::fs::create_dir_all(public.join("uploads")).unwrap();
        std::fs::write(public.join("uploads/clip.mp4"), b"mp4 data").unwrap();
        std::fs::write(dir.path().join("secret.txt"), b"nope").unwrap();

        let state = AppState {
            store: VideoStore::file(dir.path().join("db.json")),
            storage: MediaStorage::local(&public),
            transcoder: Transcoder::new("ffmpeg", false),
        };
        let app = app(Arc::new(state));

        let response = app
            .clone()
            .oneshot(Request::get("/uploads/clip.mp4").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "video/mp4");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"mp4 data");

        let response = app
            .clone()
            .oneshot(Request::get("/uploads/missing.mp4").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(
                Request::get("/uploads/..%2F..%2Fsecret.txt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
