//! Environment-driven configuration.
//!
//! Values come from the process environment (after an optional `.env` file has
//! been loaded by `main`). Unset variables fall back to defaults suitable for a
//! local single-machine deployment: media under `public/`, metadata in
//! `db.json`, `ffmpeg` from `PATH`.

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
#[error("invalid configuration: {0}")]
pub struct ConfigError(#[from] envy::Error);

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,
    /// Copy streams instead of re-encoding (fast, but cuts land on keyframes)
    #[serde(default)]
    pub ffmpeg_stream_copy: bool,

    /// When set, media goes to this GCS bucket instead of the public dir
    pub gcs_bucket_name: Option<String>,
    #[serde(default = "default_blob_public_base_url")]
    pub blob_public_base_url: String,

    pub kv_rest_api_url: Option<String>,
    pub kv_rest_api_token: Option<String>,
    #[serde(default = "default_videos_key")]
    pub kv_videos_key: String,
    pub redis_url: Option<String>,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

/// Where video metadata lives, decided once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataBackend {
    Kv { url: String, token: String, key: String },
    Redis { url: String, key: String },
    File { path: PathBuf },
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Ok(envy::from_env::<Config>()?)
    }

    /// KV wins over Redis, Redis over the local file.
    pub fn metadata_backend(&self) -> MetadataBackend {
        if let (Some(url), Some(token)) = (&self.kv_rest_api_url, &self.kv_rest_api_token) {
            return MetadataBackend::Kv {
                url: url.trim_end_matches('/').to_string(),
                token: token.clone(),
                key: self.kv_videos_key.clone(),
            };
        }

        if let Some(url) = &self.redis_url {
            return MetadataBackend::Redis {
                url: url.clone(),
                key: self.kv_videos_key.clone(),
            };
        }

        MetadataBackend::File {
            path: self.db_path.clone(),
        }
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }

    pub fn uses_blob_storage(&self) -> bool {
        self.gcs_bucket_name.is_some()
    }
}

fn default_port() -> u16 {
    3000
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_db_path() -> PathBuf {
    PathBuf::from("db.json")
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_blob_public_base_url() -> String {
    "https://storage.googleapis.com".to_string()
}

fn default_videos_key() -> String {
    "videos".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        envy::from_iter(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>(),
        )
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.public_dir, PathBuf::from("public"));
        assert_eq!(config.ffmpeg_path, "ffmpeg");
        assert!(!config.ffmpeg_stream_copy);
        assert!(!config.uses_blob_storage());
        assert!(!config.json_logs());
        assert_eq!(
            config.metadata_backend(),
            MetadataBackend::File {
                path: PathBuf::from("db.json")
            }
        );
    }

    #[test]
    fn test_kv_requires_url_and_token() {
        let config = config_from(&[("KV_REST_API_URL", "https://kv.example.com")]);
        assert!(matches!(
            config.metadata_backend(),
            MetadataBackend::File { .. }
        ));

        let config = config_from(&[
            ("KV_REST_API_URL", "https://kv.example.com/"),
            ("KV_REST_API_TOKEN", "secret"),
            ("REDIS_URL", "redis://localhost:6379"),
        ]);
        assert_eq!(
            config.metadata_backend(),
            MetadataBackend::Kv {
                url: "https://kv.example.com".into(),
                token: "secret".into(),
                key: "videos".into(),
            }
        );
    }

    #[test]
    fn test_redis_when_only_redis_url() {
        let config = config_from(&[
            ("REDIS_URL", "redis://localhost:6379"),
            ("KV_VIDEOS_KEY", "clipflow:videos"),
        ]);
        assert_eq!(
            config.metadata_backend(),
            MetadataBackend::Redis {
                url: "redis://localhost:6379".into(),
                key: "clipflow:videos".into(),
            }
        );
    }

    #[test]
    fn test_blob_and_flags() {
        let config = config_from(&[
            ("GCS_BUCKET_NAME", "clips"),
            ("FFMPEG_STREAM_COPY", "true"),
            ("LOG_FORMAT", "JSON"),
            ("PORT", "8080"),
        ]);
        assert!(config.uses_blob_storage());
        assert!(config.ffmpeg_stream_copy);
        assert!(config.json_logs());
        assert_eq!(config.port, 8080);
    }
}
