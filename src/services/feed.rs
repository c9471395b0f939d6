//! Catalog feeds behind the home, see-all, explore and search screens
//!
//! Only the trending row reports its failure to the caller (with a retry
//! hint); every other feed logs the error and degrades to an empty list.

use std::sync::Arc;

use serde::Serialize;

use crate::{
    error::AppError,
    models::{
        AvailablePlatforms, Decade, ExploreEntry, FeedCategory, GenreId, Movie, MovieId,
        MovieQuery, Page, SortOrder,
    },
    services::catalog::{watch_link, CatalogProvider},
};

const TRENDING_LIMIT: usize = 10;
const EXPLORE_LIMIT: usize = 10;

/// Outcome of a feed section that can fail visibly
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Section {
    Loaded { movies: Vec<Movie> },
    Failed { message: String, retryable: bool },
}

impl Section {
    pub fn movies(&self) -> &[Movie] {
        match self {
            Section::Loaded { movies } => movies,
            Section::Failed { .. } => &[],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HomeFeed {
    pub trending: Section,
    pub recommended: Vec<Movie>,
    pub upcoming: Vec<Movie>,
    pub genre: GenreId,
    pub by_genre: Vec<Movie>,
}

/// Search screen inputs
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub query: String,
    pub genres: Vec<GenreId>,
    /// Only the first selected period is applied
    pub periods: Vec<Decade>,
    pub sort: SortOrder,
    pub page: u32,
}

impl SearchFilters {
    pub fn to_query(&self) -> MovieQuery {
        MovieQuery {
            text: Some(self.query.clone()).filter(|q| !q.trim().is_empty()),
            genres: self.genres.clone(),
            decade: self.periods.first().copied(),
            sort: self.sort,
            page: self.page.max(1),
        }
    }
}

/// Incremental "load more" pagination over one see-all feed
#[derive(Debug, Clone)]
pub struct FeedCursor {
    pub category: FeedCategory,
    /// Pages loaded so far
    pub page: u32,
    /// Known once a page has been fetched
    pub total_pages: Option<u32>,
    pub movies: Vec<Movie>,
}

impl FeedCursor {
    pub fn new(category: FeedCategory) -> Self {
        Self::resume(category, 0)
    }

    /// Cursor for a client that already holds `loaded` pages
    pub fn resume(category: FeedCategory, loaded: u32) -> Self {
        Self {
            category,
            page: loaded,
            total_pages: None,
            movies: Vec::new(),
        }
    }

    pub fn has_more(&self) -> bool {
        self.total_pages.map_or(true, |total| self.page < total)
    }

    /// Fetches the next page. The first page replaces the list, later pages
    /// append. A failed fetch leaves the cursor where it was. Returns whether
    /// anything was fetched.
    pub async fn load_more(&mut self, feeds: &Feeds) -> bool {
        if !self.has_more() {
            return false;
        }

        let next = self.page + 1;
        let page = feeds.feed_page(self.category, next).await;
        if page.results.is_empty() && page.total_pages == 0 {
            return false;
        }

        if next == 1 {
            self.movies = page.results;
        } else {
            self.movies.extend(page.results);
        }
        self.page = next;
        self.total_pages = Some(page.total_pages);
        true
    }
}

#[derive(Clone)]
pub struct Feeds {
    catalog: Arc<dyn CatalogProvider>,
    region: String,
}

impl Feeds {
    pub fn new(catalog: Arc<dyn CatalogProvider>, region: String) -> Self {
        Self { catalog, region }
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogProvider> {
        &self.catalog
    }

    pub async fn load_home(&self, genre: GenreId) -> HomeFeed {
        let genre_query = MovieQuery::genre(genre, 1);
        let (trending, recommended, upcoming, by_genre) = tokio::join!(
            self.catalog.trending(),
            self.catalog.popular(1),
            self.catalog.upcoming(1),
            self.catalog.discover(&genre_query),
        );

        HomeFeed {
            trending: self.trending_section(trending),
            recommended: self.or_empty(recommended, "recommended").results,
            upcoming: self.or_empty(upcoming, "upcoming").results,
            genre,
            by_genre: self.or_empty(by_genre, "genre").results,
        }
    }

    /// Retries only the trending row
    pub async fn reload_trending(&self) -> Section {
        let result = self.catalog.trending().await;
        self.trending_section(result)
    }

    fn trending_section(&self, result: Result<Page<Movie>, AppError>) -> Section {
        match result {
            Ok(page) => Section::Loaded {
                movies: page.results.into_iter().take(TRENDING_LIMIT).collect(),
            },
            Err(e) => {
                tracing::error!(
                    error = %e,
                    provider = self.catalog.name(),
                    "Failed to load trending movies"
                );
                Section::Failed {
                    message: e.user_message(),
                    retryable: true,
                }
            }
        }
    }

    /// One page of a see-all feed. A failed fetch is empty but keeps the
    /// requested page number.
    pub async fn feed_page(&self, category: FeedCategory, page: u32) -> Page<Movie> {
        let page = page.max(1);
        let result = match category {
            FeedCategory::Recommended => self.catalog.popular(page).await,
            FeedCategory::Upcoming => self.catalog.upcoming(page).await,
            FeedCategory::Genre(genre) => {
                self.catalog.discover(&MovieQuery::genre(genre, page)).await
            }
        };
        Page {
            page,
            ..self.or_empty(result, "see_all")
        }
    }

    /// Upcoming movies with runtime and genres, latest release first
    pub async fn explore(&self) -> Vec<ExploreEntry> {
        let upcoming = self.or_empty(self.catalog.upcoming(1).await, "explore").results;

        let mut tasks = Vec::with_capacity(upcoming.len());
        for movie in upcoming {
            let catalog = Arc::clone(&self.catalog);
            let task = tokio::spawn(async move {
                let details = catalog.movie_details(movie.id).await;
                (movie, details)
            });
            tasks.push(task);
        }

        let mut entries = Vec::with_capacity(tasks.len());
        let mut failures = 0;
        for task in tasks {
            match task.await {
                Ok((movie, Ok(details))) => entries.push(ExploreEntry {
                    movie,
                    runtime: details.runtime,
                    genres: details.genres,
                }),
                Ok((movie, Err(e))) => {
                    failures += 1;
                    tracing::warn!(error = %e, movie_id = %movie.id, "Failed to fetch movie details");
                    entries.push(ExploreEntry {
                        movie,
                        runtime: None,
                        genres: Vec::new(),
                    });
                }
                Err(e) => {
                    failures += 1;
                    tracing::error!(error = %e, "Details task failed");
                }
            }
        }

        if failures > 0 {
            tracing::warn!(
                entries = entries.len(),
                error_count = failures,
                "Partial explore details failure"
            );
        }

        // Newest first; undated entries last
        entries.sort_by(|a, b| b.movie.release_day().cmp(&a.movie.release_day()));
        entries.truncate(EXPLORE_LIMIT);
        entries
    }

    /// Title search when text is given, filtered browse otherwise
    pub async fn search(&self, filters: &SearchFilters) -> Page<Movie> {
        let query = filters.to_query();
        let result = if query.text().is_some() {
            self.catalog.search(&query).await
        } else {
            self.catalog.discover(&query).await
        };
        self.or_empty(result, "search")
    }

    /// Provider names for `id` in the configured region. With a `title`,
    /// known providers also get a search link for it.
    pub async fn available_platforms(
        &self,
        id: MovieId,
        title: Option<&str>,
    ) -> AvailablePlatforms {
        match self.catalog.watch_providers(id).await {
            Ok(providers) => {
                let mut platforms = providers.platforms_in(&self.region);
                if let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) {
                    platforms.links = platforms
                        .names()
                        .filter_map(|name| {
                            watch_link(name, title).map(|url| (name.to_string(), url))
                        })
                        .collect();
                }
                platforms
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    movie_id = %id,
                    region = %self.region,
                    "Failed to fetch watch providers"
                );
                AvailablePlatforms::default()
            }
        }
    }

    fn or_empty(&self, result: Result<Page<Movie>, AppError>, feed: &str) -> Page<Movie> {
        result.unwrap_or_else(|e| {
            tracing::error!(
                error = %e,
                feed = feed,
                provider = self.catalog.name(),
                "Feed fetch failed, showing empty list"
            );
            Page::empty()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{Genre, MovieDetails, RegionProviders, WatchProviders, DEFAULT_GENRE},
        services::catalog::MockCatalogProvider,
    };
    use mockall::predicate::eq;
    use std::collections::HashMap;

    fn page_of(ids: std::ops::Range<u64>, page: u32, total_pages: u32) -> Page<Movie> {
        Page {
            page,
            results: ids.map(|id| Movie::new(id, format!("Movie {}", id))).collect(),
            total_pages,
            total_results: 0,
        }
    }

    fn dated(id: u64, date: Option<&str>) -> Movie {
        let mut movie = Movie::new(id, format!("Movie {}", id));
        movie.release_date = date.map(str::to_string);
        movie
    }

    fn feeds(catalog: MockCatalogProvider) -> Feeds {
        Feeds::new(Arc::new(catalog), "TH".to_string())
    }

    #[tokio::test]
    async fn test_home_trending_401_is_retryable_failure() {
        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_trending()
            .returning(|| Err(AppError::InvalidApiKey));
        catalog.expect_popular().returning(|_| Ok(page_of(1..4, 1, 1)));
        catalog
            .expect_upcoming()
            .returning(|_| Err(AppError::ExternalApi("boom".to_string())));
        catalog.expect_discover().returning(|_| Ok(page_of(10..12, 1, 1)));
        catalog.expect_name().return_const("mock");

        let home = feeds(catalog).load_home(DEFAULT_GENRE).await;

        match &home.trending {
            Section::Failed { message, retryable } => {
                assert!(message.starts_with("Invalid or expired API key"));
                assert!(*retryable);
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(home.recommended.len(), 3);
        assert!(home.upcoming.is_empty());
        assert_eq!(home.by_genre.len(), 2);
    }

    #[tokio::test]
    async fn test_home_trending_keeps_first_ten() {
        let mut catalog = MockCatalogProvider::new();
        catalog.expect_trending().returning(|| Ok(page_of(1..21, 1, 1)));
        catalog.expect_popular().returning(|_| Ok(Page::empty()));
        catalog.expect_upcoming().returning(|_| Ok(Page::empty()));
        catalog
            .expect_discover()
            .withf(|q| q.genres == vec![GenreId(35)])
            .returning(|_| Ok(Page::empty()));
        catalog.expect_name().return_const("mock");

        let home = feeds(catalog).load_home(GenreId(35)).await;
        assert_eq!(home.trending.movies().len(), 10);
        assert_eq!(home.genre, GenreId(35));
    }

    #[tokio::test]
    async fn test_cursor_appends_until_last_page() {
        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_upcoming()
            .with(eq(1))
            .returning(|_| Ok(page_of(1..3, 1, 2)));
        catalog
            .expect_upcoming()
            .with(eq(2))
            .returning(|_| Ok(page_of(3..5, 2, 2)));
        catalog.expect_name().return_const("mock");

        let feeds = feeds(catalog);
        let mut cursor = FeedCursor::new(FeedCategory::Upcoming);

        assert!(cursor.load_more(&feeds).await);
        assert_eq!(cursor.movies.len(), 2);
        assert!(cursor.load_more(&feeds).await);
        assert_eq!(cursor.movies.len(), 4);
        assert!(!cursor.has_more());
        assert!(!cursor.load_more(&feeds).await);
    }

    #[tokio::test]
    async fn test_explore_sorted_newest_first() {
        let mut catalog = MockCatalogProvider::new();
        catalog.expect_upcoming().returning(|_| {
            Ok(Page {
                page: 1,
                results: vec![
                    dated(1, Some("2024-01-05")),
                    dated(2, None),
                    dated(3, Some("2024-03-01")),
                ],
                total_pages: 1,
                total_results: 3,
            })
        });
        catalog.expect_movie_details().returning(|id| {
            if id == MovieId(3) {
                return Err(AppError::ExternalApi("timeout".to_string()));
            }
            Ok(MovieDetails {
                id,
                runtime: Some(100),
                genres: vec![Genre {
                    id: GenreId(18),
                    name: "Drama".to_string(),
                }],
            })
        });
        catalog.expect_name().return_const("mock");

        let entries = feeds(catalog).explore().await;
        let ids: Vec<_> = entries.iter().map(|e| e.movie.id).collect();
        assert_eq!(ids, vec![MovieId(3), MovieId(1), MovieId(2)]);
        assert_eq!(entries[0].runtime, None);
        assert_eq!(entries[1].runtime, Some(100));
    }

    #[tokio::test]
    async fn test_search_routes_on_text() {
        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_search()
            .withf(|q| q.text() == Some("matrix"))
            .returning(|_| Ok(page_of(1..2, 1, 1)));
        catalog
            .expect_discover()
            .withf(|q| q.decade == Some(Decade::Nineties) && q.sort == SortOrder::Rating)
            .returning(|_| Ok(page_of(5..8, 1, 1)));
        catalog.expect_name().return_const("mock");

        let feeds = feeds(catalog);
        let by_text = feeds
            .search(&SearchFilters {
                query: " matrix ".to_string(),
                ..Default::default()
            })
            .await;
        assert_eq!(by_text.results.len(), 1);

        let browsed = feeds
            .search(&SearchFilters {
                periods: vec![Decade::Nineties, Decade::Tens],
                sort: SortOrder::Rating,
                ..Default::default()
            })
            .await;
        assert_eq!(browsed.results.len(), 3);
    }

    #[tokio::test]
    async fn test_platforms_degrade_to_empty() {
        let mut catalog = MockCatalogProvider::new();
        catalog.expect_watch_providers().returning(|id| {
            if id == MovieId(1) {
                let mut results = HashMap::new();
                results.insert("US".to_string(), RegionProviders::default());
                Ok(WatchProviders { results })
            } else {
                Err(AppError::NotFound("gone".to_string()))
            }
        });

        let feeds = feeds(catalog);
        assert!(feeds.available_platforms(MovieId(1), None).await.is_empty());
        assert!(feeds.available_platforms(MovieId(2), Some("Fight Club")).await.is_empty());
    }

    #[tokio::test]
    async fn test_platforms_link_known_providers() {
        let mut catalog = MockCatalogProvider::new();
        catalog.expect_watch_providers().returning(|_| {
            let json = r#"{
                "results": {
                    "TH": {
                        "flatrate": [
                            {"provider_id": 8, "provider_name": "Netflix"},
                            {"provider_id": 99, "provider_name": "True ID"}
                        ],
                        "rent": [{"provider_id": 2, "provider_name": "Apple TV"}]
                    }
                }
            }"#;
            Ok(serde_json::from_str(json).unwrap())
        });

        let feeds = feeds(catalog);
        let platforms = feeds.available_platforms(MovieId(550), Some("Fight Club")).await;
        assert_eq!(platforms.flatrate, vec!["Netflix", "True ID"]);
        assert_eq!(
            platforms.links.get("Netflix").map(String::as_str),
            Some("https://www.netflix.com/search?q=Fight+Club")
        );
        assert_eq!(
            platforms.links.get("Apple TV").map(String::as_str),
            Some("https://tv.apple.com/search?term=Fight+Club")
        );
        assert!(!platforms.links.contains_key("True ID"));

        let untitled = feeds.available_platforms(MovieId(550), None).await;
        assert!(untitled.links.is_empty());
    }

    #[tokio::test]
    async fn test_reload_trending_recovers() {
        let mut failing = MockCatalogProvider::new();
        failing.expect_trending().returning(|| {
            Err(AppError::ExternalApi(
                "Incomplete server response: 503 Service Unavailable".to_string(),
            ))
        });
        failing.expect_name().return_const("mock");

        let section = feeds(failing).reload_trending().await;
        assert_eq!(
            section,
            Section::Failed {
                message: "Incomplete server response: 503 Service Unavailable".to_string(),
                retryable: true,
            }
        );

        let mut healthy = MockCatalogProvider::new();
        healthy.expect_trending().returning(|| Ok(page_of(1..13, 1, 1)));
        healthy.expect_name().return_const("mock");

        let section = feeds(healthy).reload_trending().await;
        assert_eq!(section.movies().len(), 10);
    }

    #[tokio::test]
    async fn test_failed_feed_page_keeps_page_number() {
        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_popular()
            .returning(|_| Err(AppError::ExternalApi("timeout".to_string())));
        catalog.expect_name().return_const("mock");

        let page = feeds(catalog).feed_page(FeedCategory::Recommended, 3).await;
        assert_eq!(page.page, 3);
        assert!(page.results.is_empty());
    }

    #[tokio::test]
    async fn test_cursor_stays_put_on_failure() {
        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_discover()
            .withf(|q| q.page == 3)
            .returning(|_| Err(AppError::ExternalApi("timeout".to_string())));
        catalog.expect_name().return_const("mock");

        let feeds = feeds(catalog);
        let mut cursor = FeedCursor::resume(FeedCategory::Genre(GenreId(35)), 2);

        assert!(!cursor.load_more(&feeds).await);
        assert_eq!(cursor.page, 2);
        assert!(cursor.has_more());
        assert!(cursor.movies.is_empty());
    }
}
