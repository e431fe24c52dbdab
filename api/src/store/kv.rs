//! REST key-value backend (Upstash-style `GET /get/{key}`, `POST /set/{key}`)

use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::{StoreError, decode_list};
use crate::models::VideoRecord;

#[derive(Debug, Clone)]
pub struct KvStore {
    client: reqwest::Client,
    url: String,
    token: String,
    key: String,
}

#[derive(Debug, Deserialize)]
struct KvReply {
    #[serde(default)]
    result: Value,
    error: Option<String>,
}

impl KvReply {
    fn into_result(self) -> Result<Value, StoreError> {
        match self.error {
            Some(error) => Err(StoreError::KvReply(error)),
            None => Ok(self.result),
        }
    }
}

impl KvStore {
    pub fn new(url: String, token: String, key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            token,
            key,
        }
    }

    /// `{url}/{command}/{key}` with the key percent-encoded as one segment
    fn endpoint(&self, command: &str) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| StoreError::KvUrl(format!("{}: {}", self.url, e)))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::KvUrl(format!("{} cannot take a path", self.url)))?
            .pop_if_empty()
            .push(command)
            .push(&self.key);
        Ok(url)
    }

    pub(super) async fn load(&self) -> Result<Vec<VideoRecord>, StoreError> {
        let reply: KvReply = self
            .client
            .get(self.endpoint("get")?)
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match reply.into_result()? {
            Value::Null => Ok(Vec::new()),
            Value::String(raw) => Ok(decode_list(&raw, "kv")),
            // Some clients store the array without string-encoding it
            other => Ok(serde_json::from_value(other).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Discarding unreadable video list from kv");
                Vec::new()
            })),
        }
    }

    pub(super) async fn save(&self, videos: &[VideoRecord]) -> Result<(), StoreError> {
        let payload = serde_json::to_string(videos)?;

        let reply: KvReply = self
            .client
            .post(self.endpoint("set")?)
            .bearer_auth(&self.token)
            .body(payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        reply.into_result().map(|_| ())
    }
}
