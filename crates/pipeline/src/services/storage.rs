//! Object storage trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::PipelineError;

/// Trait for artifact blob storage.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Uploads the bytes and returns an opaque reference URL.
    async fn upload(&self, bytes: &[u8]) -> Result<String, PipelineError>;
}

#[derive(Debug, Default)]
struct InMemoryStorageState {
    objects: HashMap<String, Vec<u8>>,
    next_id: u32,
    fail_on_upload: bool,
    upload_delay: Option<std::time::Duration>,
}

/// In-memory object storage for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectStorage {
    state: Arc<RwLock<InMemoryStorageState>>,
}

impl InMemoryObjectStorage {
    /// Creates a new in-memory object storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the storage to fail on subsequent upload calls.
    pub fn set_fail_on_upload(&self, fail: bool) {
        self.state.write().unwrap().fail_on_upload = fail;
    }

    /// Makes each upload pause first, to widen race windows in tests.
    pub fn set_upload_delay(&self, delay: std::time::Duration) {
        self.state.write().unwrap().upload_delay = Some(delay);
    }

    /// Returns the number of stored objects.
    pub fn object_count(&self) -> usize {
        self.state.read().unwrap().objects.len()
    }

    /// Returns the stored bytes for the given URL, if present.
    pub fn get(&self, url: &str) -> Option<Vec<u8>> {
        self.state.read().unwrap().objects.get(url).cloned()
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn upload(&self, bytes: &[u8]) -> Result<String, PipelineError> {
        let delay = self.state.read().unwrap().upload_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().unwrap();

        if state.fail_on_upload {
            return Err(PipelineError::Storage("Storage unavailable".to_string()));
        }

        state.next_id += 1;
        let url = format!("mem://OBJ-{:04}", state.next_id);
        state.objects.insert(url.clone(), bytes.to_vec());

        Ok(url)
    }
}
