//! The Movie Database (TMDB) v3 catalog
//!
//! Every endpoint takes the API key and language as query parameters and
//! returns JSON; list endpoints are paged via `page`/`total_pages`.
//!
//! Endpoints:
//! - /trending/movie/day, /movie/popular, /movie/upcoming
//! - /discover/movie, /search/movie
//! - /movie/{id}, /movie/{id}/watch/providers
//! - /genre/movie/list

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{Genre, Movie, MovieDetails, MovieId, MovieQuery, Page, WatchProviders},
    services::catalog::CatalogProvider,
};
use reqwest::{Client as HttpClient, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};

const LIST_CACHE_TTL: u64 = 900; // 15 minutes
const DETAILS_CACHE_TTL: u64 = 86400; // 1 day
const GENRE_CACHE_TTL: u64 = 604800; // 1 week

#[derive(Clone)]
pub struct TmdbCatalog {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    language: String,
    cache: Option<Cache>,
}

impl TmdbCatalog {
    pub fn new(api_key: String, api_url: String, language: String, cache: Option<Cache>) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            language,
            cache,
        }
    }

    /// GETs `path` with the key/language parameters plus `params`
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                path = %path,
                status = %status,
                body = %body,
                provider = "tmdb",
                "Catalog request failed"
            );
            return Err(status_error(status));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path,
                "Failed to deserialize TMDB response"
            );
            AppError::ExternalApi(format!("Invalid data structure: {}", e))
        })
    }

    async fn movie_page(&self, path: &str, params: &[(&str, String)]) -> AppResult<Page<Movie>> {
        let page: Page<Movie> = self.get_json(path, params).await?;

        tracing::debug!(
            path = %path,
            page = page.page,
            total_pages = page.total_pages,
            results = page.results.len(),
            provider = "tmdb",
            "Catalog page fetched"
        );

        Ok(page)
    }
}

/// Maps a non-success catalog status to an error
fn status_error(status: StatusCode) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED => AppError::InvalidApiKey,
        StatusCode::NOT_FOUND => AppError::NotFound("Movie not found in catalog".to_string()),
        other => AppError::ExternalApi(format!(
            "Incomplete server response: {} {}",
            other.as_u16(),
            other.canonical_reason().unwrap_or_default()
        )),
    }
}

#[derive(Deserialize)]
struct GenreList {
    #[serde(default)]
    genres: Vec<Genre>,
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbCatalog {
    async fn trending(&self) -> AppResult<Page<Movie>> {
        cached!(self.cache.as_ref(), CacheKey::Trending, LIST_CACHE_TTL, async move {
            self.movie_page("/trending/movie/day", &[]).await
        })
    }

    async fn popular(&self, page: u32) -> AppResult<Page<Movie>> {
        let page = page.max(1);
        cached!(self.cache.as_ref(), CacheKey::Popular(page), LIST_CACHE_TTL, async move {
            self.movie_page("/movie/popular", &[("page", page.to_string())])
                .await
        })
    }

    async fn upcoming(&self, page: u32) -> AppResult<Page<Movie>> {
        let page = page.max(1);
        cached!(self.cache.as_ref(), CacheKey::Upcoming(page), LIST_CACHE_TTL, async move {
            self.movie_page("/movie/upcoming", &[("page", page.to_string())])
                .await
        })
    }

    async fn discover(&self, query: &MovieQuery) -> AppResult<Page<Movie>> {
        cached!(
            self.cache.as_ref(),
            CacheKey::for_query(query),
            LIST_CACHE_TTL,
            async move {
                self.movie_page("/discover/movie", &query.filter_params())
                    .await
            }
        )
    }

    async fn search(&self, query: &MovieQuery) -> AppResult<Page<Movie>> {
        let Some(text) = query.text() else {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        };

        cached!(
            self.cache.as_ref(),
            CacheKey::for_query(query),
            LIST_CACHE_TTL,
            async move {
                let mut params = vec![("query", text.to_string())];
                params.extend(query.filter_params());

                let page = self.movie_page("/search/movie", &params).await?;
                tracing::info!(
                    query = %text,
                    results = page.results.len(),
                    provider = "tmdb",
                    "Title search completed"
                );
                Ok::<_, AppError>(page)
            }
        )
    }

    async fn movie_details(&self, id: MovieId) -> AppResult<MovieDetails> {
        cached!(
            self.cache.as_ref(),
            CacheKey::MovieDetails(id),
            DETAILS_CACHE_TTL,
            async move { self.get_json(&format!("/movie/{}", id), &[]).await }
        )
    }

    async fn watch_providers(&self, id: MovieId) -> AppResult<WatchProviders> {
        cached!(
            self.cache.as_ref(),
            CacheKey::WatchProviders(id),
            DETAILS_CACHE_TTL,
            async move {
                self.get_json(&format!("/movie/{}/watch/providers", id), &[])
                    .await
            }
        )
    }

    async fn genres(&self) -> AppResult<Vec<Genre>> {
        cached!(self.cache.as_ref(), CacheKey::Genres, GENRE_CACHE_TTL, async move {
            let list: GenreList = self.get_json("/genre/movie/list", &[]).await?;
            Ok::<_, AppError>(list.genres)
        })
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
