//! Remote user document store
//!
//! Documents live in a `users` collection keyed by user id. List mutations
//! go through [`ListOp`](crate::models::ListOp) and are applied atomically by
//! the store, so concurrent add/remove calls need no client-side locking.

use crate::{
    error::AppResult,
    models::{UserDocument, UserPatch},
};

pub mod memory;

pub use memory::InMemoryUserStore;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Fetches the document for `user_id`; `None` when it does not exist
    async fn get_document(&self, user_id: &str) -> AppResult<Option<UserDocument>>;

    /// Creates or overwrites the document for `user_id`
    async fn set_document(&self, user_id: &str, document: &UserDocument) -> AppResult<()>;

    /// Applies a partial update. Fails with `NotFound` when the document does
    /// not exist.
    async fn update_fields(&self, user_id: &str, patch: UserPatch) -> AppResult<()>;

    /// Store name for logging
    fn name(&self) -> &'static str;
}
