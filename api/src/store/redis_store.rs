//! Redis backend

use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::{StoreError, decode_list};
use crate::models::VideoRecord;

#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    key: String,
}

impl RedisStore {
    pub async fn connect(url: &str, key: String) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn, key })
    }

    pub(super) async fn load(&self) -> Result<Vec<VideoRecord>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(&self.key).await?;
        Ok(raw.map(|raw| decode_list(&raw, "redis")).unwrap_or_default())
    }

    pub(super) async fn save(&self, videos: &[VideoRecord]) -> Result<(), StoreError> {
        let payload = serde_json::to_string(videos)?;
        let mut conn = self.conn.clone();
        let _: () = conn.set(&self.key, payload).await?;
        Ok(())
    }
}
