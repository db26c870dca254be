mod local;
mod memory;
#[cfg(feature = "s3")]
mod s3_store;

pub use local::LocalObjectStore;
pub use memory::InMemoryObjectStore;
#[cfg(feature = "s3")]
pub use s3_store::S3ObjectStore;

use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::storage::{ObjectStore, StorageError};

// -- Configuration --

/// Connection settings for an S3 (or S3-compatible) bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// S3-compatible endpoint (e.g. "http://127.0.0.1:9000"). `None` means AWS.
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    S3(S3Config),
    Local {
        dir: PathBuf,
        /// Prefix for returned URLs; the key is appended after a `/`.
        public_base_url: String,
    },
}

impl StorageConfig {
    pub fn backend_name(&self) -> &'static str {
        match self {
            StorageConfig::S3(_) => "s3",
            StorageConfig::Local { .. } => "local",
        }
    }
}

// -- Factory --

/// Build the configured store. Called once at startup so bad settings fail fast.
pub fn create_store(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>, StorageError> {
    match config {
        StorageConfig::S3(s3_config) => {
            #[cfg(feature = "s3")]
            {
                Ok(Arc::new(S3ObjectStore::new(s3_config)?))
            }
            #[cfg(not(feature = "s3"))]
            {
                let _ = s3_config;
                Err(StorageError::Config(
                    "S3 configuration detected but the 's3' feature is not enabled".into(),
                ))
            }
        }
        StorageConfig::Local { dir, public_base_url } => {
            Ok(Arc::new(LocalObjectStore::new(dir.clone(), public_base_url.clone())))
        }
    }
}

// -- Key helpers --

/// Keys are flat file names: no separators, no dot segments.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\', ',']) {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

pub(crate) fn join_url(base: &str, key: &str) -> String {
    format!("{}/{key}", base.trim_end_matches('/'))
}

pub(crate) fn content_type_for_key(key: &str) -> &'static str {
    let ext = key.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}
