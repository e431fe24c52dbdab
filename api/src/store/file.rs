//! Local JSON file backend

use std::io::ErrorKind;
use std::path::PathBuf;

use super::{StoreError, decode_list};
use crate::models::VideoRecord;

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// A missing file is an empty collection.
    pub(super) async fn load(&self) -> Result<Vec<VideoRecord>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(decode_list(&raw, "file")),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write beside the target, then rename over it, so readers only ever
    /// see a complete list.
    pub(super) async fn save(&self, videos: &[VideoRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(videos)?;

        let staging = self.staging_path();
        if let Err(e) = tokio::fs::write(&staging, json).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }

    /// `db.json` -> `db.json.tmp` in the same directory
    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
