use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AuthError, AuthErrorCode, IdentityProvider};
use crate::{models::Identity, services::validation::is_valid_email};

const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    user_id: String,
    password: String,
}

/// Process-local account table for offline mode and tests.
/// Passwords are held in memory as given; never point this at real users.
#[derive(Default)]
pub struct InMemoryIdentityProvider {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        if !is_valid_email(email) {
            return Err(AuthError::new(AuthErrorCode::InvalidEmail, "INVALID_EMAIL"));
        }

        let accounts = self.accounts.read().await;
        match accounts.get(&email.to_lowercase()) {
            Some(account) if account.password == password => {
                Ok(Identity::new(account.user_id.clone(), Some(email.to_string())))
            }
            _ => Err(AuthError::new(
                AuthErrorCode::InvalidCredential,
                "INVALID_LOGIN_CREDENTIALS",
            )),
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        if !is_valid_email(email) {
            return Err(AuthError::new(AuthErrorCode::InvalidEmail, "INVALID_EMAIL"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::new(
                AuthErrorCode::WeakPassword,
                "Password should be at least 6 characters",
            ));
        }

        let mut accounts = self.accounts.write().await;
        let key = email.to_lowercase();
        if accounts.contains_key(&key) {
            return Err(AuthError::new(AuthErrorCode::EmailAlreadyInUse, "EMAIL_EXISTS"));
        }

        let user_id = Uuid::new_v4().simple().to_string();
        accounts.insert(
            key,
            Account {
                user_id: user_id.clone(),
                password: password.to_string(),
            },
        );

        Ok(Identity::new(user_id, Some(email.to_string())))
    }

    async fn sign_out(&self, _identity: &Identity) -> Result<(), AuthError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let provider = InMemoryIdentityProvider::new();
        let created = provider.sign_up("a@b.com", "Secret123").await.unwrap();
        let signed_in = provider.sign_in("A@B.com", "Secret123").await.unwrap();
        assert_eq!(created.user_id, signed_in.user_id);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let provider = InMemoryIdentityProvider::new();
        provider.sign_up("a@b.com", "Secret123").await.unwrap();
        let err = provider.sign_up("a@b.com", "Other456").await.unwrap_err();
        assert_eq!(err.code, AuthErrorCode::EmailAlreadyInUse);
    }

    #[tokio::test]
    async fn test_wrong_password_rejected() {
        let provider = InMemoryIdentityProvider::new();
        provider.sign_up("a@b.com", "Secret123").await.unwrap();
        let err = provider.sign_in("a@b.com", "secret123").await.unwrap_err();
        assert_eq!(err.user_message(), "Wrong credentials");
    }

    #[tokio::test]
    async fn test_weak_password_rejected() {
        let provider = InMemoryIdentityProvider::new();
        let err = provider.sign_up("a@b.com", "12345").await.unwrap_err();
        assert_eq!(err.code, AuthErrorCode::WeakPassword);
    }
}
