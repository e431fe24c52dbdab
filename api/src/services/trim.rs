//! Trim orchestration: resolve the input, run the transcoder, place the
//! output on disk or in blob storage, record the new video.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::constants::{TRIMMED_NAME_PREFIX, UPLOADS_FOLDER};
use crate::models::VideoRecord;
use crate::storage::{MediaStorage, StorageError};
use crate::store::{StoreError, VideoStore};
use crate::transcode::{TranscodeError, Transcoder, TrimRange};

#[derive(Debug, thiserror::Error)]
pub enum TrimError {
    #[error(transparent)]
    InvalidRange(TranscodeError),
    #[error("invalid source: {0}")]
    InvalidSource(String),
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error(transparent)]
    Transcode(TranscodeError),
    #[error(transparent)]
    Storage(StorageError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<TranscodeError> for TrimError {
    fn from(e: TranscodeError) -> Self {
        match e {
            TranscodeError::InvalidRange(_) => TrimError::InvalidRange(e),
            other => TrimError::Transcode(other),
        }
    }
}

impl From<StorageError> for TrimError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::InvalidPath(source) => TrimError::InvalidSource(source),
            StorageError::NotFound(path) => TrimError::InputNotFound(path),
            other => TrimError::Storage(other),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrimResult {
    pub id: String,
    pub url: String,
}

pub struct TrimService {
    store: VideoStore,
    storage: MediaStorage,
    transcoder: Transcoder,
    /// Scratch space for transcoder output bound for blob storage
    temp_dir: PathBuf,
}

impl TrimService {
    pub fn new(store: VideoStore, storage: MediaStorage, transcoder: Transcoder) -> Self {
        Self {
            store,
            storage,
            transcoder,
            temp_dir: std::env::temp_dir(),
        }
    }

    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    /// Cut `[start, end)` out of `source` into a new video.
    ///
    /// `source` is either an `http(s)` URL or a path under the public dir
    /// (`/uploads/abc.webm`).
    pub async fn trim_video(&self, source: &str, start: f64, end: f64) -> Result<TrimResult, TrimError> {
        let range = TrimRange::new(start, end)?;
        let input = self.storage.resolve_source(source).await?;

        let id = Uuid::new_v4().to_string();
        let filename = format!("{}{}", id, input.extension());
        let key = format!("{}/{}", UPLOADS_FOLDER, filename);

        let url = if self.storage.is_blob() {
            let temp_path = self.temp_dir.join(format!("clipflow_trim_{}", filename));
            let result = self.trim_then_upload(&input.as_input(), range, &temp_path, &key).await;
            if let Err(e) = tokio::fs::remove_file(&temp_path).await {
                tracing::debug!(path = %temp_path.display(), error = %e, "Temp trim output not removed");
            }
            result?
        } else {
            let uploads_dir = self.storage.uploads_dir();
            tokio::fs::create_dir_all(&uploads_dir)
                .await
                .map_err(StorageError::from)?;

            let output_path = uploads_dir.join(&filename);
            if let Err(e) = self.transcoder.trim(&input.as_input(), range, &output_path).await {
                let _ = tokio::fs::remove_file(&output_path).await;
                return Err(e.into());
            }
            self.storage.url_for(&key)
        };

        let record = VideoRecord::new(
            id.clone(),
            filename,
            format!("{}{}", TRIMMED_NAME_PREFIX, input.basename()),
            url.clone(),
        );
        self.store.add_video(record).await?;

        tracing::info!(
            id = %id,
            source,
            start = range.start,
            end = range.end,
            url = %url,
            "Trimmed video"
        );

        Ok(TrimResult { id, url })
    }

    async fn trim_then_upload(
        &self,
        input: &str,
        range: TrimRange,
        temp_path: &std::path::Path,
        key: &str,
    ) -> Result<String, TrimError> {
        self.transcoder.trim(input, range, temp_path).await?;
        Ok(self.storage.upload_file(temp_path, key).await?)
    }
}
