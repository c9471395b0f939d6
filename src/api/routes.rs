use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Headroom over the picture cap so oversized uploads reach validation and
/// get its message instead of a bare 413
const UPLOAD_BODY_HEADROOM: usize = 1024 * 1024;

/// Creates the main router with all routes
pub fn create_router(state: AppState) -> Router {
    let upload_limit = state.max_picture_bytes + UPLOAD_BODY_HEADROOM;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes(upload_limit))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(cors),
        )
}

fn api_routes(upload_limit: usize) -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/home", get(handlers::home))
        .route("/home/trending", get(handlers::trending))
        .route("/feeds/:category", get(handlers::feed_page))
        .route("/explore", get(handlers::explore))
        .route("/search", get(handlers::search))
        .route("/genres", get(handlers::genres))
        .route("/movies/:id", get(handlers::movie_details))
        .route("/movies/:id/platforms", get(handlers::platforms))
        // Session
        .route("/session", get(handlers::session_state))
        .route("/session/login", post(handlers::login))
        .route("/session/register", post(handlers::register))
        .route("/session/logout", post(handlers::logout))
        .route(
            "/session/list",
            get(handlers::get_list).post(handlers::add_to_list),
        )
        .route("/session/list/:movie_id", delete(handlers::remove_from_list))
        // Profile
        .route("/session/username", put(handlers::update_username))
        .route(
            "/session/profile-picture",
            put(handlers::upload_profile_picture).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/session/profile-picture/default",
            post(handlers::use_default_picture),
        )
}
