//! Email/password identity and sign-in state events
//!
//! An [`IdentityProvider`] talks to the identity backend; [`AuthService`]
//! wraps one, owns the current identity and publishes [`AuthEvent`]s to any
//! number of subscribers. Session state is derived from those events only.

use std::sync::Arc;

use tokio::sync::watch;

use crate::models::{AuthEvent, Identity};

pub mod firebase;
pub mod memory;

pub use firebase::FirebaseIdentity;
pub use memory::InMemoryIdentityProvider;

/// Error codes reported by the identity backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthErrorCode {
    InvalidEmail,
    InvalidCredential,
    EmailAlreadyInUse,
    WeakPassword,
    TooManyAttempts,
    UserDisabled,
    Network,
    Other(String),
}

impl AuthErrorCode {
    /// Maps an Identity Toolkit error message (e.g. `EMAIL_EXISTS` or
    /// `WEAK_PASSWORD : Password should be at least 6 characters`)
    pub fn from_backend(message: &str) -> Self {
        let code = message.split(':').next().unwrap_or_default().trim();
        match code {
            "INVALID_EMAIL" => AuthErrorCode::InvalidEmail,
            "INVALID_LOGIN_CREDENTIALS" | "INVALID_PASSWORD" | "EMAIL_NOT_FOUND" => {
                AuthErrorCode::InvalidCredential
            }
            "EMAIL_EXISTS" => AuthErrorCode::EmailAlreadyInUse,
            "WEAK_PASSWORD" => AuthErrorCode::WeakPassword,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthErrorCode::TooManyAttempts,
            "USER_DISABLED" => AuthErrorCode::UserDisabled,
            other => AuthErrorCode::Other(other.to_string()),
        }
    }
}

/// Failure from the identity backend, carrying its raw message
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Authentication failed ({code:?}): {message}")]
pub struct AuthError {
    pub code: AuthErrorCode,
    pub message: String,
}

impl AuthError {
    pub fn new(code: AuthErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Message suitable for showing to the user; unmapped codes pass the raw
    /// backend message through
    pub fn user_message(&self) -> String {
        match self.code {
            AuthErrorCode::InvalidEmail => "Invalid email".to_string(),
            AuthErrorCode::InvalidCredential => "Wrong credentials".to_string(),
            AuthErrorCode::EmailAlreadyInUse => "This email is already in use".to_string(),
            _ => self.message.clone(),
        }
    }
}

/// Identity backend operations
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn sign_out(&self, identity: &Identity) -> Result<(), AuthError>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Owns the current identity and fans sign-in changes out to subscribers
#[derive(Clone)]
pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
    current: Arc<watch::Sender<Option<Identity>>>,
}

impl AuthService {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            provider,
            current: Arc::new(current),
        }
    }

    /// Currently signed-in identity, if any
    pub fn current(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    /// Subscribes to sign-in changes. The first event reports the state at
    /// subscription time; dropping the subscription unsubscribes.
    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            rx: self.current.subscribe(),
            primed: false,
        }
    }

    /// Signs in and publishes `SignedIn` on success
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let identity = self.provider.sign_in(email, password).await?;
        tracing::info!(
            user_id = %identity.user_id,
            provider = self.provider.name(),
            "Signed in"
        );
        self.activate(identity.clone());
        Ok(identity)
    }

    /// Creates an account without publishing anything.
    ///
    /// Callers write whatever must exist before the session sees the user,
    /// then call [`AuthService::activate`].
    pub async fn create_account(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let identity = self.provider.sign_up(email, password).await?;
        tracing::info!(
            user_id = %identity.user_id,
            provider = self.provider.name(),
            "Account created"
        );
        Ok(identity)
    }

    /// Publishes `identity` as the signed-in user
    pub fn activate(&self, identity: Identity) {
        self.current.send_replace(Some(identity));
    }

    /// Signs out and publishes `SignedOut`. Signing out with no one signed
    /// in is a no-op.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(identity) = self.current() else {
            return Ok(());
        };
        self.provider.sign_out(&identity).await?;
        tracing::info!(user_id = %identity.user_id, "Signed out");
        self.current.send_replace(None);
        Ok(())
    }
}

/// Stream of sign-in state changes
pub struct AuthSubscription {
    rx: watch::Receiver<Option<Identity>>,
    primed: bool,
}

impl AuthSubscription {
    /// Waits for the next event. Returns `None` once the auth service is gone.
    pub async fn next(&mut self) -> Option<AuthEvent> {
        if !self.primed {
            self.primed = true;
            let current = self.rx.borrow_and_update().clone();
            return Some(current.into());
        }
        self.rx.changed().await.ok()?;
        let current = self.rx.borrow_and_update().clone();
        Some(current.into())
    }
}
