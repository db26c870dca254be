use async_trait::async_trait;
use bytes::Bytes;
use s3::creds::Credentials;
use s3::region::Region;
use s3::Bucket;

use super::{content_type_for_key, join_url, validate_key, S3Config};
use crate::domain::storage::{ObjectStore, StorageError};

pub struct S3ObjectStore {
    bucket: Box<Bucket>,
    public_base_url: String,
}

impl std::fmt::Debug for S3ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ObjectStore")
            .field("public_base_url", &self.public_base_url)
            .finish_non_exhaustive()
    }
}

impl S3ObjectStore {
    pub fn new(config: &S3Config) -> Result<Self, StorageError> {
        let region = match &config.endpoint_url {
            Some(endpoint) => Region::Custom { region: config.region.clone(), endpoint: endpoint.clone() },
            None => config
                .region
                .parse::<Region>()
                .map_err(|e| StorageError::Config(format!("region {}: {e}", config.region)))?,
        };

        let credentials = Credentials::new(
            Some(config.access_key_id.as_str()),
            Some(config.secret_access_key.as_str()),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Config(format!("credentials: {e}")))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| StorageError::Config(format!("bucket: {e}")))?;
        if config.endpoint_url.is_some() {
            bucket.set_path_style();
        }

        Ok(Self { bucket, public_base_url: public_base_url(config) })
    }
}

/// Base under which uploaded keys are publicly addressable.
fn public_base_url(config: &S3Config) -> String {
    match &config.endpoint_url {
        Some(endpoint) => join_url(endpoint, &config.bucket),
        None => format!("https://{}.s3.{}.amazonaws.com", config.bucket, config.region),
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn upload(&self, key: &str, data: Bytes) -> Result<String, StorageError> {
        validate_key(key)?;
        let response = self
            .bucket
            .put_object_with_content_type(key, &data, content_type_for_key(key))
            .await
            .map_err(|e| StorageError::Upload { key: key.to_string(), reason: format!("s3: {e}") })?;
        if response.status_code() >= 300 {
            return Err(StorageError::Upload {
                key: key.to_string(),
                reason: format!("status {}", response.status_code()),
            });
        }
        Ok(join_url(&self.public_base_url, key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let response = self
            .bucket
            .delete_object(key)
            .await
            .map_err(|e| StorageError::Delete { key: key.to_string(), reason: format!("s3: {e}") })?;
        match response.status_code() {
            code if code < 300 || code == 404 => Ok(()),
            code => Err(StorageError::Delete { key: key.to_string(), reason: format!("status {code}") }),
        }
    }
}
