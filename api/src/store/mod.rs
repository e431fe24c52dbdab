//! Video metadata store.
//!
//! The whole collection is one JSON array kept in a single place: a local
//! file, a REST key-value service, or Redis. Every mutation reads the array,
//! changes it and writes all of it back. Within this process the
//! read-modify-write cycle is serialized; across processes the last writer wins.

mod file;
mod kv;
mod redis_store;

pub use file::JsonFileStore;
pub use kv::KvStore;
pub use redis_store::RedisStore;

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::MetadataBackend;
use crate::models::VideoRecord;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("metadata file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode video list: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("key-value request failed: {0}")]
    Kv(#[from] reqwest::Error),
    #[error("invalid key-value endpoint: {0}")]
    KvUrl(String),
    #[error("key-value store replied with an error: {0}")]
    KvReply(String),
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("video {0} already exists")]
    DuplicateId(String),
}

#[derive(Clone)]
enum Backend {
    File(JsonFileStore),
    Kv(KvStore),
    Redis(RedisStore),
}

impl Backend {
    async fn load(&self) -> Result<Vec<VideoRecord>, StoreError> {
        match self {
            Backend::File(store) => store.load().await,
            Backend::Kv(store) => store.load().await,
            Backend::Redis(store) => store.load().await,
        }
    }

    async fn save(&self, videos: &[VideoRecord]) -> Result<(), StoreError> {
        match self {
            Backend::File(store) => store.save(videos).await,
            Backend::Kv(store) => store.save(videos).await,
            Backend::Redis(store) => store.save(videos).await,
        }
    }
}

/// Handle to the configured metadata backend. Cheap to clone.
#[derive(Clone)]
pub struct VideoStore {
    backend: Backend,
    lock: Arc<Mutex<()>>,
}

impl VideoStore {
    pub async fn connect(backend: &MetadataBackend) -> Result<Self, StoreError> {
        let backend = match backend {
            MetadataBackend::Kv { url, token, key } => {
                Backend::Kv(KvStore::new(url.clone(), token.clone(), key.clone()))
            }
            MetadataBackend::Redis { url, key } => {
                Backend::Redis(RedisStore::connect(url, key.clone()).await?)
            }
            MetadataBackend::File { path } => Backend::File(JsonFileStore::new(path.clone())),
        };

        Ok(Self::from_backend(backend))
    }

    pub fn file(path: impl Into<std::path::PathBuf>) -> Self {
        Self::from_backend(Backend::File(JsonFileStore::new(path.into())))
    }

    pub fn kv(store: KvStore) -> Self {
        Self::from_backend(Backend::Kv(store))
    }

    pub fn redis(store: RedisStore) -> Self {
        Self::from_backend(Backend::Redis(store))
    }

    fn from_backend(backend: Backend) -> Self {
        Self {
            backend,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::File(_) => "file",
            Backend::Kv(_) => "kv",
            Backend::Redis(_) => "redis",
        }
    }

    /// Append a new record. Ids must be unique across the collection.
    pub async fn add_video(&self, video: VideoRecord) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut videos = self.backend.load().await?;

        if videos.iter().any(|v| v.id == video.id) {
            return Err(StoreError::DuplicateId(video.id));
        }

        videos.push(video);
        self.backend.save(&videos).await
    }

    pub async fn get_video(&self, id: &str) -> Result<Option<VideoRecord>, StoreError> {
        let videos = self.backend.load().await?;
        Ok(videos.into_iter().find(|v| v.id == id))
    }

    /// Count one view. Returns the updated record, or `None` (and writes
    /// nothing) when the id is unknown.
    pub async fn increment_views(&self, id: &str) -> Result<Option<VideoRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut videos = self.backend.load().await?;

        let Some(video) = videos.iter_mut().find(|v| v.id == id) else {
            return Ok(None);
        };
        video.views = video.views.saturating_add(1);
        let updated = video.clone();

        self.backend.save(&videos).await?;
        Ok(Some(updated))
    }

    /// All records, newest first
    pub async fn list_videos(&self) -> Result<Vec<VideoRecord>, StoreError> {
        let mut videos = self.backend.load().await?;
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(videos)
    }
}

/// Parse a stored video list. Unreadable content counts as an empty list.
fn decode_list(raw: &str, source: &str) -> Vec<VideoRecord> {
    match serde_json::from_str(raw) {
        Ok(videos) => videos,
        Err(e) => {
            tracing::warn!(source, error = %e, "Discarding unreadable video list");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn record(id: &str) -> VideoRecord {
        VideoRecord::new(
            id.into(),
            format!("{}.webm", id),
            "recording.webm".into(),
            format!("/uploads/{}.webm", id),
        )
    }

    #[tokio::test]
    async fn test_add_get_and_count_views() {
        let dir = tempfile::tempdir().unwrap();
        let store = VideoStore::file(dir.path().join("db.json"));

        store.add_video(record("a")).await.unwrap();
        store.add_video(record("b")).await.unwrap();

        let a = store.get_video("a").await.unwrap().unwrap();
        assert_eq!(a.views, 0);
        assert!(store.get_video("missing").await.unwrap().is_none());

        let a = store.increment_views("a").await.unwrap().unwrap();
        assert_eq!(a.views, 1);
        let a = store.increment_views("a").await.unwrap().unwrap();
        assert_eq!(a.views, 2);

        let b = store.get_video("b").await.unwrap().unwrap();
        assert_eq!(b.views, 0);
    }

    #[tokio::test]
    async fn test_increment_unknown_id_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let store = VideoStore::file(&path);

        assert!(store.increment_views("ghost").await.unwrap().is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = VideoStore::file(dir.path().join("db.json"));

        store.add_video(record("a")).await.unwrap();
        let err = store.add_video(record("a")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(id) if id == "a"));
        assert_eq!(store.list_videos().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_views_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = VideoStore::file(dir.path().join("db.json"));
        store.add_video(record("a")).await.unwrap();

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..20 {
            let store = store.clone();
            tasks.spawn(async move { store.increment_views("a").await.unwrap() });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap();
        }

        assert_eq!(store.get_video("a").await.unwrap().unwrap().views, 20);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_lookups_during_view_counting_find_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = VideoStore::file(dir.path().join("db.json"));
        let videos: Vec<_> = (0..3000).map(|i| record(&format!("id-{}", i))).collect();
        JsonFileStore::new(dir.path().join("db.json"))
            .save(&videos)
            .await
            .unwrap();

        let counter = {
            let store = store.clone();
            tokio::spawn(async move {
                for _ in 0..200 {
                    store.increment_views("id-0").await.unwrap();
                }
            })
        };

        while !counter.is_finished() {
            assert!(store.get_video("id-2999").await.unwrap().is_some());
        }
        counter.await.unwrap();

        assert_eq!(store.get_video("id-0").await.unwrap().unwrap().views, 200);
        assert_eq!(store.list_videos().await.unwrap().len(), 3000);
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = VideoStore::file(dir.path().join("db.json"));

        let mut old = record("old");
        old.created_at = Utc::now() - Duration::hours(1);
        store.add_video(old).await.unwrap();
        store.add_video(record("new")).await.unwrap();

        let ids: Vec<_> = store
            .list_videos()
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[test]
    fn test_decode_list_tolerates_garbage() {
        assert!(decode_list("{not json", "test").is_empty());
        assert!(decode_list("[]", "test").is_empty());
    }
}
