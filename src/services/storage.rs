// src/services/storage.rs
use std::time::{Duration, SystemTime};

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::config::app_config::{SigningConfig, StorageConfig};
use crate::services::signing::truncated_signing_time;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("List failed: {0}")]
    ListFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Presign failed: {0}")]
    PresignFailed(String),
}

/// S3 bucket holding thumbnail images. Objects are private; reads go through
/// signed URLs only.
#[derive(Clone)]
pub struct ObjectStorage {
    client: Client,
    bucket: String,
    url_expiry: Duration,
    cache_window: Duration,
}

impl ObjectStorage {
    pub fn new(storage: &StorageConfig, signing: &SigningConfig) -> Self {
        let credentials = Credentials::new(
            &storage.access_key_id,
            &storage.secret_access_key,
            None,
            None,
            "app-config",
        );

        let mut builder = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(storage.region.clone()))
            .credentials_provider(credentials);
        if let Some(endpoint) = &storage.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: storage.bucket.clone(),
            url_expiry: Duration::from_secs(signing.url_expiry_secs),
            cache_window: Duration::from_secs(signing.cache_window_secs),
        }
    }

    /// Key for one uploaded thumbnail file, namespaced by video id.
    pub fn thumbnail_key(video_id: Uuid, file_name: &str) -> String {
        format!("thumbnails/{}/{}", video_id, file_name)
    }

    /// Prefix covering every thumbnail object of one video.
    pub fn thumbnail_prefix(video_id: Uuid) -> String {
        format!("thumbnails/{}", video_id)
    }

    pub async fn upload(&self, key: &str, data: Vec<u8>, content_type: &str) -> StorageResult<()> {
        log::debug!("Uploading {} bytes to {}", data.len(), key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        Ok(())
    }

    /// Signed GET URL for `key`, or `None` when presigning fails. The caller
    /// treats a missing URL as a blank thumbnail rather than an error.
    pub async fn signed_url(&self, key: &str) -> Option<String> {
        match self.signed_url_at(key, Utc::now()).await {
            Ok(url) => Some(url),
            Err(e) => {
                log::error!("Error creating signed URL for {}: {}", key, e);
                None
            }
        }
    }

    // Presigning runs as-of the truncated instant, not the request time, so
    // every request in the same cache window yields a byte-identical URL.
    async fn signed_url_at(&self, key: &str, now: DateTime<Utc>) -> StorageResult<String> {
        let start = truncated_signing_time(now, self.cache_window);
        let start_time = SystemTime::UNIX_EPOCH + Duration::from_secs(start.timestamp() as u64);

        let presign_config = PresigningConfig::builder()
            .start_time(start_time)
            .expires_in(self.url_expiry)
            .build()
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }

    /// Directory-style listing of object keys under `prefix`.
    pub async fn list_keys(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let prefix = if prefix.ends_with('/') {
            prefix.to_string()
        } else {
            format!("{}/", prefix)
        };
        log::debug!("Listing objects under {}", prefix);

        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&prefix);

            if let Some(token) = continuation_token {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| StorageError::ListFailed(e.to_string()))?;

            for object in response.contents() {
                if let Some(key) = object.key() {
                    keys.push(key.to_string());
                }
            }

            if response.is_truncated() == Some(true) {
                continuation_token = response.next_continuation_token;
            } else {
                break;
            }
        }

        Ok(keys)
    }

    /// Deletes one object. S3 delete is idempotent, so an absent key is not
    /// an error here.
    pub async fn delete(&self, key: &str) -> StorageResult<()> {
        log::debug!("Deleting {}", key);

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_storage(cache_window_secs: u64) -> ObjectStorage {
        let storage = StorageConfig {
            region: "ap-northeast-1".to_string(),
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "secret".to_string(),
            bucket: "bookmark-thumbnails".to_string(),
            endpoint_url: None,
        };
        let signing = SigningConfig {
            url_expiry_secs: 86400,
            cache_window_secs,
        };
        ObjectStorage::new(&storage, &signing)
    }

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn thumbnail_keys_are_namespaced_by_video_id() {
        let id = Uuid::nil();
        assert_eq!(
            ObjectStorage::thumbnail_key(id, "a.png"),
            format!("thumbnails/{}/a.png", id)
        );
        assert!(ObjectStorage::thumbnail_key(id, "a.png")
            .starts_with(&ObjectStorage::thumbnail_prefix(id)));
    }

    // SigV4 presigning with static credentials is pure computation, so these
    // run without a bucket.
    #[tokio::test]
    async fn urls_signed_in_same_window_are_identical() {
        let storage = test_storage(86400);
        let a = storage
            .signed_url_at("thumbnails/x/a.png", at("2024-03-05T00:10:00Z"))
            .await
            .unwrap();
        let b = storage
            .signed_url_at("thumbnails/x/a.png", at("2024-03-05T23:50:00Z"))
            .await
            .unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn urls_signed_in_different_windows_differ() {
        let storage = test_storage(86400);
        let a = storage
            .signed_url_at("thumbnails/x/a.png", at("2024-03-05T12:00:00Z"))
            .await
            .unwrap();
        let b = storage
            .signed_url_at("thumbnails/x/a.png", at("2024-03-06T12:00:00Z"))
            .await
            .unwrap();
        assert_ne!(a, b);
    }
}
