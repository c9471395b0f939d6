pub mod auth;
pub mod blob;
pub mod catalog;
pub mod feed;
pub mod profile;
pub mod session;
pub mod store;
pub mod validation;

pub use auth::{AuthService, FirebaseIdentity, IdentityProvider, InMemoryIdentityProvider};
pub use blob::{BlobStore, FirebaseStorage, InMemoryBlobStore};
pub use catalog::{CatalogProvider, TmdbCatalog};
pub use feed::{FeedCursor, Feeds, HomeFeed, SearchFilters, Section};
pub use profile::ProfileService;
pub use session::{SessionListenerHandle, SessionManager};
pub use store::{InMemoryUserStore, UserStore};
