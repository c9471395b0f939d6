use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::{
        AvailablePlatforms, Decade, ExploreEntry, FeedCategory, Genre, GenreId, Movie,
        MovieDetails, MovieId, Page, SessionState, SortOrder, User, DEFAULT_GENRE,
    },
    services::{
        feed::{FeedCursor, HomeFeed, SearchFilters, Section},
        validation::{RegistrationForm, SignInForm},
    },
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct HomeParams {
    pub genre: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct FeedParams {
    pub page: Option<u32>,
    pub genre: Option<u64>,
}

/// Search screen query string. `genres` and `period` are comma-separated.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub genres: Option<String>,
    pub period: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
}

impl SearchParams {
    fn into_filters(self) -> AppResult<SearchFilters> {
        let genres = split_list(self.genres.as_deref())
            .map(|g| {
                g.parse::<u64>()
                    .map(GenreId)
                    .map_err(|_| AppError::InvalidInput(format!("Invalid genre id: {}", g)))
            })
            .collect::<AppResult<Vec<_>>>()?;

        let periods = split_list(self.period.as_deref())
            .map(|p| p.parse::<Decade>().map_err(AppError::InvalidInput))
            .collect::<AppResult<Vec<_>>>()?;

        let sort = match self.sort.as_deref().filter(|s| !s.is_empty()) {
            Some(sort) => sort.parse::<SortOrder>().map_err(AppError::InvalidInput)?,
            None => SortOrder::default(),
        };

        Ok(SearchFilters {
            query: self.q.unwrap_or_default(),
            genres,
            periods,
            sort,
            page: self.page.unwrap_or(1),
        })
    }
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[derive(Debug, Deserialize)]
pub struct PlatformParams {
    /// Title used for the providers' search links
    pub title: Option<String>,
}

/// One "see all" page. `page` is the last page loaded, so a failed fetch
/// reports the previous page and `has_more` stays true.
#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub page: u32,
    pub total_pages: Option<u32>,
    pub has_more: bool,
    pub movies: Vec<Movie>,
}

impl From<FeedCursor> for FeedResponse {
    fn from(cursor: FeedCursor) -> Self {
        Self {
            page: cursor.page,
            total_pages: cursor.total_pages,
            has_more: cursor.has_more(),
            movies: cursor.movies,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UsernameRequest {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub movies: Vec<Movie>,
}

fn accepted() -> (StatusCode, Json<Value>) {
    (StatusCode::ACCEPTED, Json(json!({ "status": "pending" })))
}

/// The signed-in user; every session route acts on its behalf
fn session_user(state: &AppState) -> AppResult<User> {
    state
        .session
        .current_user()
        .ok_or(AppError::Unauthenticated)
}

// Catalog

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

pub async fn home(State(state): State<AppState>, Query(params): Query<HomeParams>) -> Json<HomeFeed> {
    let genre = params.genre.map(GenreId).unwrap_or(DEFAULT_GENRE);
    Json(state.feeds.load_home(genre).await)
}

pub async fn trending(State(state): State<AppState>) -> Json<Section> {
    Json(state.feeds.reload_trending().await)
}

pub async fn feed_page(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(params): Query<FeedParams>,
) -> Json<FeedResponse> {
    let category = FeedCategory::parse(&category, params.genre.map(GenreId));
    let requested = params.page.unwrap_or(1).max(1);

    let mut cursor = FeedCursor::resume(category, requested - 1);
    cursor.load_more(&state.feeds).await;
    Json(FeedResponse::from(cursor))
}

pub async fn explore(State(state): State<AppState>) -> Json<Vec<ExploreEntry>> {
    Json(state.feeds.explore().await)
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Page<Movie>>> {
    let filters = params.into_filters()?;
    Ok(Json(state.feeds.search(&filters).await))
}

pub async fn genres(State(state): State<AppState>) -> AppResult<Json<Vec<Genre>>> {
    Ok(Json(state.feeds.catalog().genres().await?))
}

pub async fn movie_details(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> AppResult<Json<MovieDetails>> {
    Ok(Json(state.feeds.catalog().movie_details(MovieId(id)).await?))
}

pub async fn platforms(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(params): Query<PlatformParams>,
) -> Json<AvailablePlatforms> {
    Json(
        state
            .feeds
            .available_platforms(MovieId(id), params.title.as_deref())
            .await,
    )
}

// Session

pub async fn session_state(State(state): State<AppState>) -> Json<SessionState> {
    Json(state.session.state())
}

/// Sign-in is accepted once the credentials check out; the session flips to
/// authenticated when the auth event is applied.
pub async fn login(
    State(state): State<AppState>,
    Json(form): Json<SignInForm>,
) -> AppResult<(StatusCode, Json<Value>)> {
    state.session.login(form).await?;
    Ok(accepted())
}

pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegistrationForm>,
) -> AppResult<(StatusCode, Json<Value>)> {
    state.session.register(form).await?;
    Ok(accepted())
}

pub async fn logout(State(state): State<AppState>) -> AppResult<(StatusCode, Json<Value>)> {
    state.session.logout().await?;
    Ok(accepted())
}

pub async fn get_list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<ListResponse>> {
    let user = session_user(&state)?;
    let movies = user
        .my_list
        .filter_by_title(params.q.as_deref().unwrap_or_default());
    Ok(Json(ListResponse { movies }))
}

pub async fn add_to_list(
    State(state): State<AppState>,
    Json(movie): Json<Movie>,
) -> AppResult<Json<ListResponse>> {
    let user = session_user(&state)?;
    let list = state.session.add_to_list(&user.user_id, movie).await?;
    Ok(Json(ListResponse {
        movies: list.into_vec(),
    }))
}

pub async fn remove_from_list(
    State(state): State<AppState>,
    Path(movie_id): Path<u64>,
) -> AppResult<Json<ListResponse>> {
    let user = session_user(&state)?;
    let list = state
        .session
        .remove_from_list(&user.user_id, MovieId(movie_id))
        .await?;
    Ok(Json(ListResponse {
        movies: list.into_vec(),
    }))
}

// Profile

pub async fn update_username(
    State(state): State<AppState>,
    Json(request): Json<UsernameRequest>,
) -> AppResult<Json<User>> {
    let user = session_user(&state)?;
    let updated = state.profile.rename(&user.user_id, &request.username).await?;
    Ok(Json(updated))
}

/// Takes the raw image as the request body
pub async fn upload_profile_picture(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<User>> {
    let user = session_user(&state)?;
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("image/jpeg");

    let updated = state
        .profile
        .upload_picture(&user.user_id, body.to_vec(), content_type)
        .await?;
    Ok(Json(updated))
}

pub async fn use_default_picture(State(state): State<AppState>) -> AppResult<Json<User>> {
    let user = session_user(&state)?;
    let updated = state.profile.use_default_picture(&user.user_id).await?;
    Ok(Json(updated))
}
