//! Movie catalog abstraction
//!
//! Read-only, paged access to a public movie catalog. [`tmdb::TmdbCatalog`]
//! is the production implementation; feeds and handlers only see the trait.

use crate::{
    error::AppResult,
    models::{Genre, Movie, MovieDetails, MovieId, MovieQuery, Page, WatchProviders},
};

mod links;
pub mod tmdb;

pub use links::watch_link;
pub use tmdb::TmdbCatalog;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Movies trending today
    async fn trending(&self) -> AppResult<Page<Movie>>;

    /// Popular movies, shown as "recommended"
    async fn popular(&self, page: u32) -> AppResult<Page<Movie>>;

    async fn upcoming(&self, page: u32) -> AppResult<Page<Movie>>;

    /// Browse by filters (genres, release decade, sort order)
    async fn discover(&self, query: &MovieQuery) -> AppResult<Page<Movie>>;

    /// Title search. The filters in `query` are forwarded as well.
    async fn search(&self, query: &MovieQuery) -> AppResult<Page<Movie>>;

    async fn movie_details(&self, id: MovieId) -> AppResult<MovieDetails>;

    /// Watch providers for every region
    async fn watch_providers(&self, id: MovieId) -> AppResult<WatchProviders>;

    async fn genres(&self) -> AppResult<Vec<Genre>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
