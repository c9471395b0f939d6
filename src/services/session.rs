//! Session and watch-list manager
//!
//! Holds the signed-in user's snapshot and is the only path for writes to the
//! user store. Session state changes only in response to auth events:
//! `login`/`register`/`logout` delegate to [`AuthService`] and return before
//! the state has flipped, so callers that need the result wait on
//! [`SessionManager::wait_for`] or a [`SessionManager::watch`] receiver.
//!
//! List mutations are written remotely first; the in-memory list changes
//! only after the store confirms the write.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::{
    error::{AppError, AppResult},
    models::{
        AuthEvent, Identity, Movie, MovieId, SessionState, User, UserDocument, UserPatch,
        WatchList,
    },
    services::{
        auth::AuthService,
        store::UserStore,
        validation::{RegistrationForm, SignInForm},
    },
};

pub struct SessionManager {
    auth: AuthService,
    store: Arc<dyn UserStore>,
    state: watch::Sender<SessionState>,
}

/// Handle for stopping the auth event listener
pub struct SessionListenerHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl SessionListenerHandle {
    /// Stops the listener and waits for it to finish the event in flight
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Session listener task failed");
        }
        tracing::info!("Session listener stopped");
    }
}

impl SessionManager {
    pub fn new(auth: AuthService, store: Arc<dyn UserStore>) -> Self {
        let (state, _) = watch::channel(SessionState::Unknown);
        Self { auth, store, state }
    }

    /// Subscribes to the auth service and applies its events until shut down
    pub fn spawn_listener(self: &Arc<Self>) -> SessionListenerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let mut subscription = self.auth.subscribe();
        let session = Arc::clone(self);

        let task = tokio::spawn(async move {
            tracing::info!("Session listener started");
            loop {
                tokio::select! {
                    event = subscription.next() => match event {
                        Some(event) => session.apply_event(event).await,
                        None => break,
                    },
                    _ = shutdown_rx.recv() => break,
                }
            }
        });

        SessionListenerHandle { shutdown_tx, task }
    }

    pub async fn apply_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(identity) => {
                self.state.send_replace(SessionState::Authenticating);
                let user = self.load_user(&identity).await;
                tracing::info!(
                    user_id = %user.user_id,
                    list_size = user.my_list.len(),
                    "Session authenticated"
                );
                self.state.send_replace(SessionState::Authenticated(user));
            }
            AuthEvent::SignedOut => {
                self.state.send_replace(SessionState::Unauthenticated);
                tracing::info!("Session cleared");
            }
        }
    }

    /// Merges the identity with its stored document. A missing document or a
    /// failed fetch both yield an empty profile.
    async fn load_user(&self, identity: &Identity) -> User {
        let document = match self.store.get_document(&identity.user_id).await {
            Ok(Some(document)) => Some(document),
            Ok(None) => {
                tracing::warn!(
                    user_id = %identity.user_id,
                    store = self.store.name(),
                    "No user document, using empty profile"
                );
                None
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    user_id = %identity.user_id,
                    store = self.store.name(),
                    "Failed to fetch user document, using empty profile"
                );
                None
            }
        };
        User::from_parts(identity, document)
    }

    pub async fn login(&self, form: SignInForm) -> AppResult<()> {
        form.validate()?;
        self.auth.sign_in(&form.email, &form.password).await?;
        Ok(())
    }

    /// Creates the account and its document, then announces the sign-in.
    /// A failed document write leaves no one signed in.
    pub async fn register(&self, form: RegistrationForm) -> AppResult<()> {
        form.validate()?;

        let identity = self.auth.create_account(&form.email, &form.password).await?;
        let document = UserDocument::new(identity.user_id.clone(), form.username.clone());
        self.store
            .set_document(&identity.user_id, &document)
            .await?;

        tracing::info!(
            user_id = %identity.user_id,
            username = %form.username,
            "User registered"
        );
        self.auth.activate(identity);
        Ok(())
    }

    pub async fn logout(&self) -> AppResult<()> {
        self.auth.sign_out().await?;
        Ok(())
    }

    /// The signed-in user, provided it is `user_id`
    fn authorize(&self, user_id: &str) -> AppResult<User> {
        match &*self.state.borrow() {
            SessionState::Authenticated(user) if user.user_id == user_id => Ok(user.clone()),
            SessionState::Authenticated(_) => Err(AppError::Forbidden),
            _ => Err(AppError::Unauthenticated),
        }
    }

    /// Applies `update` to the session user if it is still `user_id`
    fn modify_user(&self, user_id: &str, update: impl FnOnce(&mut User) -> bool) -> Option<User> {
        let mut current = None;
        self.state.send_if_modified(|state| match state {
            SessionState::Authenticated(user) if user.user_id == user_id => {
                let modified = update(user);
                current = Some(user.clone());
                modified
            }
            _ => false,
        });
        current
    }

    /// Adds `movie` to the watch-list. Adding a movie already listed leaves a
    /// single copy.
    pub async fn add_to_list(&self, user_id: &str, movie: Movie) -> AppResult<WatchList> {
        let user = self.authorize(user_id)?;
        let movie_id = movie.id;

        self.store
            .update_fields(user_id, UserPatch::list_union(movie.clone()))
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    user_id = %user_id,
                    movie_id = %movie_id,
                    "Failed to add movie to list"
                );
                e
            })?;

        let updated = self.modify_user(user_id, |user| user.my_list.insert(movie));
        tracing::info!(user_id = %user_id, movie_id = %movie_id, "Movie added to list");

        Ok(updated.map(|u| u.my_list).unwrap_or(user.my_list))
    }

    /// Removes the movie with `movie_id` from the watch-list
    pub async fn remove_from_list(&self, user_id: &str, movie_id: MovieId) -> AppResult<WatchList> {
        let user = self.authorize(user_id)?;

        self.store
            .update_fields(user_id, UserPatch::list_remove(movie_id))
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    user_id = %user_id,
                    movie_id = %movie_id,
                    "Failed to remove movie from list"
                );
                e
            })?;

        let updated = self.modify_user(user_id, |user| user.my_list.remove(movie_id).is_some());
        tracing::info!(user_id = %user_id, movie_id = %movie_id, "Movie removed from list");

        Ok(updated.map(|u| u.my_list).unwrap_or(user.my_list))
    }

    /// Session errors pass through; store failures become a generic message
    pub async fn update_username(&self, user_id: &str, username: &str) -> AppResult<User> {
        let user = self.authorize(user_id)?;
        self.update_and_refresh(user, UserPatch::username(username))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, user_id = %user_id, "Failed to update username");
                AppError::ProfileUpdate("Failed to update username".to_string())
            })
    }

    pub async fn update_profile_picture(&self, user_id: &str, url: &str) -> AppResult<User> {
        let user = self.authorize(user_id)?;
        self.update_and_refresh(user, UserPatch::profile_picture(url))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, user_id = %user_id, "Failed to update profile picture");
                AppError::ProfileUpdate("Failed to update profile picture".to_string())
            })
    }

    /// Writes one field, then re-reads the whole document into the session
    async fn update_and_refresh(&self, user: User, patch: UserPatch) -> AppResult<User> {
        let user_id = user.user_id.as_str();

        self.store.update_fields(user_id, patch).await?;
        let document = self
            .store
            .get_document(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User document {}", user_id)))?;

        let refreshed = self.modify_user(user_id, |current| {
            let before = current.clone();
            current.refresh_from(document.clone());
            *current != before
        });

        Ok(refreshed.unwrap_or_else(|| {
            let mut user = user;
            user.refresh_from(document);
            user
        }))
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Waits until the state satisfies `predicate` and returns it
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&SessionState) -> bool,
    ) -> AppResult<SessionState> {
        let mut rx = self.state.subscribe();
        let state = rx
            .wait_for(predicate)
            .await
            .map_err(|e| AppError::Internal(format!("Session state closed: {}", e)))?;
        Ok(state.clone())
    }
}
