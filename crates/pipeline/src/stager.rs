//! Artifact staging stage.

use domain::{FileRole, StagedFile};

use crate::error::PipelineError;
use crate::services::ObjectStorage;

/// Uploads order artifacts to durable storage.
///
/// Staging is all-or-nothing per attempt: both artifacts upload
/// concurrently, and either failure aborts the attempt before
/// validation starts.
pub struct FileStager<S: ObjectStorage> {
    storage: S,
}

impl<S: ObjectStorage> FileStager<S> {
    /// Creates a stager over the given storage.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Uploads interior and cover concurrently, returning both staged
    /// records or the first failure.
    #[tracing::instrument(skip_all, fields(interior_bytes = interior.len(), cover_bytes = cover.len()))]
    pub async fn stage_pair(
        &self,
        interior: &[u8],
        cover: &[u8],
    ) -> Result<(StagedFile, StagedFile), PipelineError> {
        // Reject empty artifacts before any network call.
        if interior.is_empty() {
            return Err(PipelineError::UploadFailed {
                reason: "Interior file is empty".to_string(),
            });
        }
        if cover.is_empty() {
            return Err(PipelineError::UploadFailed {
                reason: "Cover file is empty".to_string(),
            });
        }

        let (interior_url, cover_url) = tokio::try_join!(
            self.stage_one(interior, FileRole::Interior),
            self.stage_one(cover, FileRole::Cover),
        )?;

        Ok((
            StagedFile::new(interior_url, interior.len() as u64, FileRole::Interior),
            StagedFile::new(cover_url, cover.len() as u64, FileRole::Cover),
        ))
    }

    async fn stage_one(&self, bytes: &[u8], role: FileRole) -> Result<String, PipelineError> {
        self.storage
            .upload(bytes)
            .await
            .map_err(|e| PipelineError::UploadFailed {
                reason: format!("{} upload failed: {}", role, e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryObjectStorage;

    #[tokio::test]
    async fn test_stage_pair() {
        let storage = InMemoryObjectStorage::new();
        let stager = FileStager::new(storage.clone());

        let (interior, cover) = stager.stage_pair(b"interior", b"cover").await.unwrap();

        assert_eq!(interior.role, FileRole::Interior);
        assert_eq!(interior.byte_size, 8);
        assert_eq!(cover.role, FileRole::Cover);
        assert_eq!(cover.byte_size, 5);
        assert_eq!(storage.object_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_interior_rejected_before_upload() {
        let storage = InMemoryObjectStorage::new();
        let stager = FileStager::new(storage.clone());

        let result = stager.stage_pair(b"", b"cover").await;
        assert!(matches!(result, Err(PipelineError::UploadFailed { .. })));
        assert_eq!(storage.object_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_cover_rejected_before_upload() {
        let storage = InMemoryObjectStorage::new();
        let stager = FileStager::new(storage.clone());

        let result = stager.stage_pair(b"interior", b"").await;
        assert!(matches!(result, Err(PipelineError::UploadFailed { .. })));
        assert_eq!(storage.object_count(), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_maps_to_upload_failed() {
        let storage = InMemoryObjectStorage::new();
        storage.set_fail_on_upload(true);
        let stager = FileStager::new(storage);

        let result = stager.stage_pair(b"interior", b"cover").await;
        match result {
            Err(PipelineError::UploadFailed { reason }) => {
                assert!(reason.contains("upload failed"));
            }
            other => panic!("Expected UploadFailed, got {:?}", other.map(|_| ())),
        }
    }
}
