//! Profile edits: picture upload, default avatar and username changes

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::User,
    services::{
        blob::{profile_picture_path, BlobStore, BlobUpload},
        session::SessionManager,
        validation::validate_image,
    },
};

pub struct ProfileService {
    session: Arc<SessionManager>,
    blobs: Arc<dyn BlobStore>,
    default_picture_url: String,
    max_picture_bytes: usize,
}

impl ProfileService {
    pub fn new(
        session: Arc<SessionManager>,
        blobs: Arc<dyn BlobStore>,
        default_picture_url: String,
        max_picture_bytes: usize,
    ) -> Self {
        Self {
            session,
            blobs,
            default_picture_url,
            max_picture_bytes,
        }
    }

    /// Uploads a new profile picture and points the user document at it.
    ///
    /// Size checks run before anything leaves the process.
    pub async fn upload_picture(
        &self,
        user_id: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> AppResult<User> {
        validate_image(&bytes, self.max_picture_bytes)?;

        let user = self
            .session
            .current_user()
            .filter(|u| u.user_id == user_id)
            .ok_or(AppError::Unauthenticated)?;

        let size = bytes.len();
        let url = self
            .blobs
            .upload(BlobUpload {
                path: profile_picture_path(user_id),
                bytes,
                content_type: content_type.to_string(),
                auth_token: user.id_token.clone(),
            })
            .await?;

        tracing::info!(
            user_id = %user_id,
            bytes = size,
            store = self.blobs.name(),
            "Profile picture uploaded"
        );

        self.session.update_profile_picture(user_id, &url).await
    }

    /// Switches the user to the stock avatar
    pub async fn use_default_picture(&self, user_id: &str) -> AppResult<User> {
        self.session
            .update_profile_picture(user_id, &self.default_picture_url)
            .await
    }

    /// Renames the user. Blank or unchanged names leave the store untouched.
    pub async fn rename(&self, user_id: &str, username: &str) -> AppResult<User> {
        let username = username.trim();
        let current = self
            .session
            .current_user()
            .filter(|u| u.user_id == user_id)
            .ok_or(AppError::Unauthenticated)?;

        if username.is_empty() || username == current.username {
            tracing::debug!(user_id = %user_id, "Username unchanged, skipping update");
            return Ok(current);
        }

        self.session.update_username(user_id, username).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{AuthEvent, Identity, UserDocument},
        services::{
            auth::{AuthService, InMemoryIdentityProvider},
            blob::{InMemoryBlobStore, MockBlobStore},
            store::{InMemoryUserStore, MockUserStore, UserStore},
            validation::{ValidationError, MAX_PROFILE_PICTURE_BYTES},
        },
    };

    const DEFAULT_URL: &str = "https://img.example/default.png";

    async fn signed_in(store: Arc<dyn UserStore>) -> Arc<SessionManager> {
        let auth = AuthService::new(Arc::new(InMemoryIdentityProvider::new()));
        let session = Arc::new(SessionManager::new(auth, store));
        session
            .apply_event(AuthEvent::SignedIn(Identity::new("uid-1", None)))
            .await;
        session
    }

    async fn seeded_store() -> Arc<InMemoryUserStore> {
        let store = Arc::new(InMemoryUserStore::new());
        store
            .set_document("uid-1", &UserDocument::new("uid-1", "alice"))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_upload_sets_picture_url() {
        let blobs = Arc::new(InMemoryBlobStore::new());
        let session = signed_in(seeded_store().await).await;
        let profile = ProfileService::new(
            session.clone(),
            blobs.clone(),
            DEFAULT_URL.to_string(),
            MAX_PROFILE_PICTURE_BYTES,
        );

        let user = profile
            .upload_picture("uid-1", vec![7u8; 1024], "image/jpeg")
            .await
            .unwrap();

        assert_eq!(user.profile_picture, "memory://profilePictures/uid-1");
        assert_eq!(blobs.object_size("profilePictures/uid-1").await, Some(1024));
        assert_eq!(
            session.current_user().unwrap().profile_picture,
            "memory://profilePictures/uid-1"
        );
    }

    #[tokio::test]
    async fn test_size_cap_is_inclusive() {
        let session = signed_in(seeded_store().await).await;
        let profile = ProfileService::new(
            session,
            Arc::new(InMemoryBlobStore::new()),
            DEFAULT_URL.to_string(),
            MAX_PROFILE_PICTURE_BYTES,
        );

        let exact = vec![0u8; MAX_PROFILE_PICTURE_BYTES];
        assert!(profile.upload_picture("uid-1", exact, "image/png").await.is_ok());
    }

    #[tokio::test]
    async fn test_oversized_and_empty_images_never_upload() {
        let session = signed_in(seeded_store().await).await;
        // Any upload call would panic on the bare mock
        let profile = ProfileService::new(
            session,
            Arc::new(MockBlobStore::new()),
            DEFAULT_URL.to_string(),
            MAX_PROFILE_PICTURE_BYTES,
        );

        let too_big = vec![0u8; MAX_PROFILE_PICTURE_BYTES + 1];
        let err = profile
            .upload_picture("uid-1", too_big, "image/png")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::ImageTooLarge { .. })
        ));

        let err = profile
            .upload_picture("uid-1", Vec::new(), "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::NoImage)));
    }

    #[tokio::test]
    async fn test_default_picture() {
        let session = signed_in(seeded_store().await).await;
        let profile = ProfileService::new(
            session,
            Arc::new(InMemoryBlobStore::new()),
            DEFAULT_URL.to_string(),
            MAX_PROFILE_PICTURE_BYTES,
        );

        let user = profile.use_default_picture("uid-1").await.unwrap();
        assert_eq!(user.profile_picture, DEFAULT_URL);
    }

    #[tokio::test]
    async fn test_blank_or_same_name_skips_store() {
        let mut store = MockUserStore::new();
        store
            .expect_get_document()
            .returning(|user_id| Ok(Some(UserDocument::new(user_id, "alice"))));
        store.expect_update_fields().never();
        store.expect_name().return_const("mock");

        let session = signed_in(Arc::new(store)).await;
        let profile = ProfileService::new(
            session,
            Arc::new(InMemoryBlobStore::new()),
            DEFAULT_URL.to_string(),
            MAX_PROFILE_PICTURE_BYTES,
        );

        assert_eq!(profile.rename("uid-1", "   ").await.unwrap().username, "alice");
        assert_eq!(profile.rename("uid-1", " alice ").await.unwrap().username, "alice");
    }

    #[tokio::test]
    async fn test_rename_trims() {
        let session = signed_in(seeded_store().await).await;
        let profile = ProfileService::new(
            session,
            Arc::new(InMemoryBlobStore::new()),
            DEFAULT_URL.to_string(),
            MAX_PROFILE_PICTURE_BYTES,
        );

        let user = profile.rename("uid-1", "  alicia ").await.unwrap();
        assert_eq!(user.username, "alicia");
    }
}
