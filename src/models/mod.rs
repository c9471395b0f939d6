mod catalog;
mod movie;
mod session;
mod user;

pub use catalog::{
    AvailablePlatforms, Decade, ExploreEntry, FeedCategory, Genre, GenreId, MovieDetails,
    MovieQuery, Page, Provider, RegionProviders, SortOrder, WatchProviders, DEFAULT_GENRE,
};
pub use movie::{Movie, MovieId, WatchList};
pub use session::{AuthEvent, SessionState};
pub use user::{Identity, ListOp, User, UserDocument, UserPatch};
