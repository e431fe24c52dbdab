//! Media placement: the local public directory or a GCS bucket.
//!
//! Local mode writes under `{public_dir}/uploads/` and hands out
//! `/uploads/...` URLs served by this process. Blob mode is for deployments
//! without a writable filesystem: media is uploaded to the bucket and the
//! public object URL is returned instead.

use bytes::Bytes;
use google_cloud_storage::client::Storage;
use std::path::{Component, Path, PathBuf};
use url::Url;

use crate::config::Config;
use crate::constants::{DEFAULT_EXTENSION, UPLOADS_FOLDER};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid media path: {0}")]
    InvalidPath(String),
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("local storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("blob storage error: {0}")]
    Blob(String),
    #[error("no blob storage configured")]
    BlobNotConfigured,
}

#[derive(Clone)]
enum BlobClient {
    Gcs(Storage),
    #[cfg(test)]
    Memory(MemoryBlob),
}

/// In-memory bucket for exercising blob mode without GCS
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct MemoryBlob {
    pub objects: std::sync::Arc<std::sync::Mutex<std::collections::HashMap<String, Bytes>>>,
    pub unavailable: bool,
}

#[derive(Clone)]
struct BlobTarget {
    client: BlobClient,
    bucket: String,
    public_base_url: String,
}

/// Where a trim reads from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    Local(PathBuf),
    Remote(Url),
}

impl MediaSource {
    /// The argument handed to the transcoder
    pub fn as_input(&self) -> String {
        match self {
            MediaSource::Local(path) => path.to_string_lossy().into_owned(),
            MediaSource::Remote(url) => url.to_string(),
        }
    }

    /// Last path segment, e.g. `abc.webm`
    pub fn basename(&self) -> String {
        match self {
            MediaSource::Local(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            MediaSource::Remote(url) => url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .unwrap_or_default()
                .to_string(),
        }
    }

    /// Extension including the dot, `.webm` when the source has none
    pub fn extension(&self) -> String {
        let name = self.basename();
        match Path::new(&name).extension().and_then(|e| e.to_str()) {
            Some(ext) if !ext.is_empty() => format!(".{}", ext),
            _ => format!(".{}", DEFAULT_EXTENSION),
        }
    }
}

#[derive(Clone)]
pub struct MediaStorage {
    public_dir: PathBuf,
    blob: Option<BlobTarget>,
}

impl MediaStorage {
    /// Local-disk storage rooted at `public_dir`
    pub fn local(public_dir: impl Into<PathBuf>) -> Self {
        Self {
            public_dir: public_dir.into(),
            blob: None,
        }
    }

    /// Build from config; a GCS client is created only when a bucket is named.
    /// GCS credentials come from `GOOGLE_APPLICATION_CREDENTIALS`.
    pub async fn connect(config: &Config) -> Result<Self, StorageError> {
        let mut storage = Self::local(&config.public_dir);

        if let Some(bucket) = &config.gcs_bucket_name {
            let client = Storage::builder()
                .build()
                .await
                .map_err(|e| StorageError::Blob(format!("GCS client init failed: {}", e)))?;

            storage.blob = Some(BlobTarget {
                client: BlobClient::Gcs(client),
                bucket: bucket.clone(),
                public_base_url: config.blob_public_base_url.trim_end_matches('/').to_string(),
            });
        }

        Ok(storage)
    }

    #[cfg(test)]
    pub(crate) fn with_memory_blob(public_dir: impl Into<PathBuf>, bucket: &str, blob: MemoryBlob) -> Self {
        Self {
            public_dir: public_dir.into(),
            blob: Some(BlobTarget {
                client: BlobClient::Memory(blob),
                bucket: bucket.to_string(),
                public_base_url: "https://storage.googleapis.com".to_string(),
            }),
        }
    }

    pub fn is_blob(&self) -> bool {
        self.blob.is_some()
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.public_dir.join(UPLOADS_FOLDER)
    }

    /// Resolve a trim input: `http(s)` URLs pass through, anything else is a
    /// path relative to the public dir and must exist.
    pub async fn resolve_source(&self, source: &str) -> Result<MediaSource, StorageError> {
        if let Ok(url) = Url::parse(source) {
            if matches!(url.scheme(), "http" | "https") {
                return Ok(MediaSource::Remote(url));
            }
        }

        let clean = source.strip_prefix('/').unwrap_or(source);
        if clean.is_empty() || clean.contains('\0') || !is_plain_relative(Path::new(clean)) {
            return Err(StorageError::InvalidPath(source.to_string()));
        }

        let path = self.public_dir.join(clean);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(MediaSource::Local(path)),
            _ => Err(StorageError::NotFound(path)),
        }
    }

    /// Public URL for an object key such as `uploads/abc.webm`
    pub fn url_for(&self, key: &str) -> String {
        match &self.blob {
            Some(blob) => format!("{}/{}/{}", blob.public_base_url, blob.bucket, key),
            None => format!("/{}", key),
        }
    }

    /// Store bytes under `key` and return its public URL.
    pub async fn save(&self, key: &str, data: Bytes) -> Result<String, StorageError> {
        match &self.blob {
            Some(blob) => {
                blob.write(key, data).await?;
                tracing::info!(key, bucket = %blob.bucket, "Uploaded media to blob storage");
            }
            None => {
                let full_path = self.public_dir.join(key);
                if let Some(parent) = full_path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&full_path, &data).await?;
                tracing::info!(path = %full_path.display(), bytes = data.len(), "Saved media locally");
            }
        }

        Ok(self.url_for(key))
    }

    /// Upload a finished local file (e.g. transcoder output in a temp dir) to
    /// blob storage under `key`.
    pub async fn upload_file(&self, file: &Path, key: &str) -> Result<String, StorageError> {
        let blob = self.blob.as_ref().ok_or(StorageError::BlobNotConfigured)?;
        let data = tokio::fs::read(file).await?;
        let size = data.len();
        blob.write(key, Bytes::from(data)).await?;
        tracing::info!(key, bucket = %blob.bucket, bytes = size, "Uploaded file to blob storage");
        Ok(self.url_for(key))
    }
}

impl BlobTarget {
    async fn write(&self, key: &str, data: Bytes) -> Result<(), StorageError> {
        match &self.client {
            BlobClient::Gcs(client) => {
                let bucket = format!("projects/_/buckets/{}", self.bucket);
                client
                    .write_object(&bucket, key, data)
                    .send_buffered()
                    .await
                    .map_err(|e| StorageError::Blob(format!("GCS write failed: {}", e)))?;
            }
            #[cfg(test)]
            BlobClient::Memory(blob) => {
                if blob.unavailable {
                    return Err(StorageError::Blob(format!("bucket {} unavailable", self.bucket)));
                }
                blob.objects.lock().unwrap().insert(key.to_string(), data);
            }
        }
        Ok(())
    }
}

/// Only normal components: no root, no `..`, no drive prefix.
fn is_plain_relative(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// File extension for an upload's MIME type: `video/webm;codecs=vp9` -> `webm`
pub fn extension_for(content_type: &str) -> String {
    let essence = content_type.split(';').next().unwrap_or_default();
    let subtype = essence
        .split('/')
        .nth(1)
        .map(|s| s.trim().to_ascii_lowercase())
        .unwrap_or_default();

    match subtype.as_str() {
        "x-matroska" => "mkv".to_string(),
        "quicktime" => "mov".to_string(),
        "x-msvideo" => "avi".to_string(),
        "jpeg" => "jpg".to_string(),
        "" => DEFAULT_EXTENSION.to_string(),
        sub if sub.chars().all(|c| c.is_ascii_alphanumeric()) => sub.to_string(),
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

/// Content type for serving a stored file
pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        Some("ogg") | Some("ogv") => "video/ogg",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
