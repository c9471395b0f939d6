use std::collections::HashMap;

use tokio::sync::RwLock;

use super::UserStore;
use crate::{
    error::{AppError, AppResult},
    models::{UserDocument, UserPatch},
};

/// User store held in process memory, for offline mode and tests
#[derive(Default)]
pub struct InMemoryUserStore {
    documents: RwLock<HashMap<String, UserDocument>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_document(&self, user_id: &str) -> AppResult<Option<UserDocument>> {
        Ok(self.documents.read().await.get(user_id).cloned())
    }

    async fn set_document(&self, user_id: &str, document: &UserDocument) -> AppResult<()> {
        self.documents
            .write()
            .await
            .insert(user_id.to_string(), document.clone());
        Ok(())
    }

    async fn update_fields(&self, user_id: &str, patch: UserPatch) -> AppResult<()> {
        let mut documents = self.documents.write().await;
        let document = documents
            .get_mut(user_id)
            .ok_or_else(|| AppError::NotFound(format!("User document {}", user_id)))?;
        patch.apply_to(document);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Movie, MovieId};

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let store = InMemoryUserStore::new();
        let result = store
            .update_fields("ghost", UserPatch::username("boo"))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_union_is_idempotent() {
        let store = InMemoryUserStore::new();
        store
            .set_document("u1", &UserDocument::new("u1", "neo"))
            .await
            .unwrap();

        for _ in 0..2 {
            store
                .update_fields("u1", UserPatch::list_union(Movie::new(42, "X")))
                .await
                .unwrap();
        }

        let doc = store.get_document("u1").await.unwrap().unwrap();
        assert_eq!(doc.my_list.ids(), vec![MovieId(42)]);
    }

    #[tokio::test]
    async fn test_set_document_overwrites() {
        let store = InMemoryUserStore::new();
        let mut doc = UserDocument::new("u1", "neo");
        doc.my_list.insert(Movie::new(1, "A"));
        store.set_document("u1", &doc).await.unwrap();
        store
            .set_document("u1", &UserDocument::new("u1", "thomas"))
            .await
            .unwrap();

        let stored = store.get_document("u1").await.unwrap().unwrap();
        assert_eq!(stored.username, "thomas");
        assert!(stored.my_list.is_empty());
    }
}
