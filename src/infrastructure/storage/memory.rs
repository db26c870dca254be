use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use super::{join_url, validate_key};
use crate::domain::storage::{ObjectStore, StorageError};

/// Keeps objects in a map; used by tests and throwaway runs.
#[derive(Clone)]
pub struct InMemoryObjectStore {
    objects: Arc<Mutex<BTreeMap<String, Bytes>>>,
    base_url: String,
}

impl Default for InMemoryObjectStore {
    fn default() -> Self { Self::new("memory://attachments") }
}

impl InMemoryObjectStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { objects: Arc::default(), base_url: base_url.into() }
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().map(|objects| objects.keys().cloned().collect()).unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.objects.lock().ok().and_then(|objects| objects.get(key).cloned())
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn upload(&self, key: &str, data: Bytes) -> Result<String, StorageError> {
        validate_key(key)?;
        self.objects
            .lock()
            .map_err(|_| StorageError::Upload { key: key.to_string(), reason: "lock poisoned".into() })?
            .insert(key.to_string(), data);
        Ok(join_url(&self.base_url, key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects
            .lock()
            .map_err(|_| StorageError::Delete { key: key.to_string(), reason: "lock poisoned".into() })?
            .remove(key);
        Ok(())
    }
}
