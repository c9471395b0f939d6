//! Binary object storage for profile pictures

use crate::error::AppResult;

pub mod firebase;
pub mod memory;

pub use firebase::FirebaseStorage;
pub use memory::InMemoryBlobStore;

/// Object to upload
#[derive(Debug, Clone)]
pub struct BlobUpload {
    /// Object path, e.g. `profilePictures/{userId}`
    pub path: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
    /// Signed-in user's token, for stores that authorize uploads per user
    pub auth_token: Option<String>,
}

/// Object path of a user's profile picture
pub fn profile_picture_path(user_id: &str) -> String {
    format!("profilePictures/{}", user_id)
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores the object, replacing any existing one at the same path, and
    /// returns a public download URL
    async fn upload(&self, upload: BlobUpload) -> AppResult<String>;

    fn name(&self) -> &'static str;
}
