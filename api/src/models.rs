//! Shared data models used across modules

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A recorded or trimmed video as persisted by the metadata store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: String,
    pub filename: String,
    pub original_name: String,
    /// URL or `/uploads/...` path of the media content
    pub path: String,
    pub created_at: DateTime<Utc>,
    /// Older entries may lack the counter entirely
    #[serde(default)]
    pub views: u64,
}

impl VideoRecord {
    /// A fresh record with zero views, stamped now
    pub fn new(id: String, filename: String, original_name: String, path: String) -> Self {
        Self {
            id,
            filename,
            original_name,
            path,
            created_at: Utc::now(),
            views: 0,
        }
    }
}

/// Returned to clients after an upload or trim completes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMedia {
    pub id: String,
    pub url: String,
    pub filename: String,
}
