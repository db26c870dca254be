use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("upload of {key} failed: {reason}")]
    Upload { key: String, reason: String },

    #[error("delete of {key} failed: {reason}")]
    Delete { key: String, reason: String },

    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("storage configuration: {0}")]
    Config(String),
}

/// A store for attachment files keyed by name.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Write (create or overwrite) an object and return its public URL.
    async fn upload(&self, key: &str, data: Bytes) -> Result<String, StorageError>;

    /// Delete an object. No-op if absent.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}
