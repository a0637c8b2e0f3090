//! HTTP object storage client with content-addressed keys.

use async_trait::async_trait;
use pipeline::{ObjectStorage, PipelineError};
use sha2::{Digest, Sha256};

use crate::config::StorageConfig;

/// Object storage client that PUTs artifacts under a sha256 content
/// key, so identical bytes land at the same URL on every attempt.
pub struct HttpObjectStorage {
    client: reqwest::Client,
    config: StorageConfig,
}

impl HttpObjectStorage {
    /// Creates a storage client.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn content_key(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        format!("{:x}", hasher.finalize())
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    #[tracing::instrument(skip_all, fields(bytes = bytes.len()))]
    async fn upload(&self, bytes: &[u8]) -> Result<String, PipelineError> {
        let url = format!(
            "{}/artifacts/{}",
            self.config.base_url,
            Self::content_key(bytes)
        );

        let response = self
            .client
            .put(&url)
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| PipelineError::Storage(format!("Upload failed: {}", e)))?;

        // A conflict on a content-addressed key means the identical
        // object is already there.
        if response.status() == reqwest::StatusCode::CONFLICT || response.status().is_success() {
            return Ok(url);
        }

        Err(PipelineError::Storage(format!(
            "Upload returned {}",
            response.status()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_key_is_stable() {
        let a = HttpObjectStorage::content_key(b"interior bytes");
        let b = HttpObjectStorage::content_key(b"interior bytes");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_content_key_differs_per_content() {
        let a = HttpObjectStorage::content_key(b"interior");
        let b = HttpObjectStorage::content_key(b"cover");
        assert_ne!(a, b);
    }

    #[test]
    fn test_known_digest() {
        // sha256 of the empty input
        assert_eq!(
            HttpObjectStorage::content_key(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
