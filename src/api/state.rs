use std::sync::Arc;

use crate::services::{
    AuthService, BlobStore, CatalogProvider, Feeds, IdentityProvider, InMemoryBlobStore,
    InMemoryIdentityProvider, InMemoryUserStore, ProfileService, SessionListenerHandle,
    SessionManager, UserStore,
};

/// Remote collaborators the session depends on
pub struct Backends {
    pub identity: Arc<dyn IdentityProvider>,
    pub users: Arc<dyn UserStore>,
    pub blobs: Arc<dyn BlobStore>,
}

impl Backends {
    /// Process-local backends for offline mode and tests
    pub fn in_memory() -> Self {
        Self {
            identity: Arc::new(InMemoryIdentityProvider::new()),
            users: Arc::new(InMemoryUserStore::new()),
            blobs: Arc::new(InMemoryBlobStore::new()),
        }
    }
}

/// Profile picture settings
#[derive(Debug, Clone)]
pub struct PictureSettings {
    pub default_url: String,
    pub max_bytes: usize,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub feeds: Feeds,
    pub session: Arc<SessionManager>,
    pub profile: Arc<ProfileService>,
    pub max_picture_bytes: usize,
}

impl AppState {
    /// Wires the services and starts the session's auth listener. Must be
    /// called inside a Tokio runtime.
    pub fn new(
        catalog: Arc<dyn CatalogProvider>,
        region: String,
        backends: Backends,
        pictures: PictureSettings,
    ) -> (Self, SessionListenerHandle) {
        let auth = AuthService::new(backends.identity);
        let session = Arc::new(SessionManager::new(auth, backends.users));
        let listener = session.spawn_listener();

        let profile = Arc::new(ProfileService::new(
            Arc::clone(&session),
            backends.blobs,
            pictures.default_url,
            pictures.max_bytes,
        ));

        let state = Self {
            feeds: Feeds::new(catalog, region),
            session,
            profile,
            max_picture_bytes: pictures.max_bytes,
        };

        (state, listener)
    }
}
