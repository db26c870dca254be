use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;

use super::{join_url, validate_key};
use crate::domain::storage::{ObjectStore, StorageError};

/// Files under a local directory, served back through `public_base_url`.
pub struct LocalObjectStore {
    base_dir: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    pub fn new(base_dir: PathBuf, public_base_url: String) -> Self { Self { base_dir, public_base_url } }

    pub fn base_dir(&self) -> &PathBuf { &self.base_dir }

    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.base_dir.join(key))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(&self, key: &str, data: Bytes) -> Result<String, StorageError> {
        let path = self.resolve(key)?;
        let upload_err = |e: std::io::Error| StorageError::Upload { key: key.to_string(), reason: e.to_string() };
        tokio::fs::create_dir_all(&self.base_dir).await.map_err(upload_err)?;
        tokio::fs::write(&path, &data).await.map_err(upload_err)?;
        Ok(join_url(&self.public_base_url, key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Delete { key: key.to_string(), reason: e.to_string() }),
        }
    }
}
