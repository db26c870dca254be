use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::infrastructure::storage::{S3Config, StorageConfig};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set when AWS_S3_BUCKET_NAME is set")]
    Missing(&'static str),

    #[error("{var} has invalid value {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub request_timeout: Duration,
    pub max_upload_bytes: usize,
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Read from the process environment (call `dotenvy::dotenv()` first to pick up `.env`).
    pub fn from_env() -> Result<Self, ConfigError> { Self::from_lookup(|var| std::env::var(var).ok()) }

    /// Read through an arbitrary lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").unwrap_or_else(|| "sqlite://todos.db".to_string());
        let bind_addr = parse_or("BIND_ADDR", get("BIND_ADDR"), SocketAddr::from(([127, 0, 0, 1], 8080)))?;
        let request_timeout = Duration::from_secs(parse_or("REQUEST_TIMEOUT_SECS", get("REQUEST_TIMEOUT_SECS"), 30)?);
        let max_upload_bytes = parse_or("MAX_UPLOAD_BYTES", get("MAX_UPLOAD_BYTES"), 10 * 1024 * 1024)?;

        let storage = match get("AWS_S3_BUCKET_NAME") {
            Some(bucket) => {
                let require = |var: &'static str| get(var).ok_or(ConfigError::Missing(var));
                StorageConfig::S3(S3Config {
                    bucket,
                    region: require("AWS_REGION")?,
                    access_key_id: require("AWS_ACCESS_KEY_ID")?,
                    secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
                    endpoint_url: get("AWS_ENDPOINT_URL"),
                })
            }
            None => StorageConfig::Local {
                dir: PathBuf::from(get("LOCAL_STORAGE_DIR").unwrap_or_else(|| "./uploads".to_string())),
                public_base_url: get("PUBLIC_BASE_URL").unwrap_or_else(|| format!("http://{bind_addr}/files")),
            },
        };

        Ok(Self { database_url, bind_addr, request_timeout, max_upload_bytes, storage })
    }
}

fn parse_or<T: FromStr>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}
