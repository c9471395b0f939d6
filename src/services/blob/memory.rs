use std::collections::HashMap;

use tokio::sync::RwLock;

use super::{BlobStore, BlobUpload};
use crate::error::AppResult;

/// Blob store held in process memory, for offline mode and tests
#[derive(Default)]
pub struct InMemoryBlobStore {
    objects: RwLock<HashMap<String, (String, Vec<u8>)>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size in bytes of the object at `path`
    pub async fn object_size(&self, path: &str) -> Option<usize> {
        self.objects
            .read()
            .await
            .get(path)
            .map(|(_, bytes)| bytes.len())
    }
}

#[async_trait::async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(&self, upload: BlobUpload) -> AppResult<String> {
        let url = format!("memory://{}", upload.path);
        self.objects
            .write()
            .await
            .insert(upload.path, (upload.content_type, upload.bytes));
        Ok(url)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
