//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws` (editor bridge with grace-period completion)
/// - REST-ish API under `/api/v1/...`
/// - Static SPA from the configured directory with index fallback
/// - CORS (any origin/method/headers; the server only listens on loopback by default)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.server.static_dir.clone();
    let static_service = ServeDir::new(&static_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(format!("{}/index.html", static_dir)));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // Catalog
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/exercises", get(http::http_list_exercises))
        .route("/api/v1/exercises/:id", get(http::http_get_exercise))
        .route("/api/v1/exercises/:id/solution", get(http::http_get_solution))
        .route("/api/v1/exercises/:id/initial", get(http::http_get_initial_code))
        // Session
        .route("/api/v1/profile", post(http::http_post_profile))
        .route("/api/v1/state", get(http::http_get_state))
        .route("/api/v1/exercises/:id/start", post(http::http_post_start))
        .route("/api/v1/exercises/:id/hint", post(http::http_post_hint))
        .route("/api/v1/check", post(http::http_post_check))
        .route("/api/v1/complete", post(http::http_post_complete))
        // Read models
        .route("/api/v1/progress", get(http::http_get_progress))
        .route("/api/v1/leaderboard", get(http::http_get_leaderboard))
        .route("/api/v1/daily", get(http::http_get_daily))
        .route("/api/v1/theme", get(http::http_get_theme).put(http::http_put_theme))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
