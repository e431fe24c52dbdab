//! Storing uploaded recordings

use bytes::Bytes;
use uuid::Uuid;

use crate::constants::{DEFAULT_RECORDING_NAME, UPLOADS_FOLDER};
use crate::models::{StoredMedia, VideoRecord};
use crate::storage::{MediaStorage, StorageError, extension_for};
use crate::store::{StoreError, VideoStore};

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("uploaded file is empty")]
    EmptyUpload,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Save `data` under `uploads/{id}.{ext}` and record it.
pub async fn upload_video(
    store: &VideoStore,
    storage: &MediaStorage,
    data: Bytes,
    content_type: &str,
    original_name: Option<&str>,
) -> Result<StoredMedia, UploadError> {
    if data.is_empty() {
        return Err(UploadError::EmptyUpload);
    }

    let id = Uuid::new_v4().to_string();
    let filename = format!("{}.{}", id, extension_for(content_type));
    let key = format!("{}/{}", UPLOADS_FOLDER, filename);

    let url = storage.save(&key, data).await?;

    let original_name = original_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(DEFAULT_RECORDING_NAME);

    store
        .add_video(VideoRecord::new(
            id.clone(),
            filename.clone(),
            original_name.to_string(),
            url.clone(),
        ))
        .await?;

    tracing::info!(id = %id, content_type, url = %url, "Stored upload");

    Ok(StoredMedia { id, url, filename })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_saves_and_records() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::local(dir.path().join("public"));
        let store = VideoStore::file(dir.path().join("db.json"));

        let stored = upload_video(
            &store,
            &storage,
            Bytes::from_static(b"webm bytes"),
            "video/webm;codecs=vp9",
            None,
        )
        .await
        .unwrap();

        assert_eq!(stored.filename, format!("{}.webm", stored.id));
        assert_eq!(stored.url, format!("/uploads/{}", stored.filename));
        assert_eq!(
            std::fs::read(storage.uploads_dir().join(&stored.filename)).unwrap(),
            b"webm bytes"
        );

        let record = store.get_video(&stored.id).await.unwrap().unwrap();
        assert_eq!(record.original_name, "recording.webm");
        assert_eq!(record.views, 0);
    }

    #[tokio::test]
    async fn test_upload_keeps_client_name_and_rejects_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::local(dir.path().join("public"));
        let store = VideoStore::file(dir.path().join("db.json"));

        let stored = upload_video(&store, &storage, Bytes::from_static(b"x"), "video/mp4", Some("demo.mp4"))
            .await
            .unwrap();
        assert!(stored.filename.ends_with(".mp4"));
        let record = store.get_video(&stored.id).await.unwrap().unwrap();
        assert_eq!(record.original_name, "demo.mp4");

        let err = upload_video(&store, &storage, Bytes::new(), "video/webm", None)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::EmptyUpload));
    }
}
