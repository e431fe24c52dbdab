//! ClipFlow media service: recording uploads, server-side trimming through
//! ffmpeg, and view counting over a swappable metadata store.

pub mod config;
pub mod constants;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;
pub mod storage;
pub mod store;
pub mod transcode;

use axum::{Router, extract::DefaultBodyLimit};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use config::Config;
use constants::MAX_UPLOAD_SIZE;
use storage::{MediaStorage, StorageError};
use store::{StoreError, VideoStore};
use transcode::Transcoder;

#[derive(Clone)]
pub struct AppState {
    pub store: VideoStore,
    pub storage: MediaStorage,
    pub transcoder: Transcoder,
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("could not open metadata store: {0}")]
    Store(#[from] StoreError),
    #[error("could not set up media storage: {0}")]
    Storage(#[from] StorageError),
}

impl AppState {
    pub async fn from_config(config: &Config) -> Result<Self, StartupError> {
        let store = VideoStore::connect(&config.metadata_backend()).await?;
        let storage = MediaStorage::connect(config).await?;
        let transcoder = Transcoder::from_config(config);

        Ok(Self {
            store,
            storage,
            transcoder,
        })
    }
}

/// Full application router
pub fn app(state: Arc<AppState>) -> Router {
    routes::build_routes()
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
