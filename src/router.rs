//! Route definitions for the Docserve HTTP API.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::status::health))
        .route("/formats", get(handlers::status::formats))
        .route("/metrics", get(handlers::status::metrics))
        .route("/plugins", get(handlers::status::plugins));

    Router::new()
        .nest("/api", api_routes)
        .route("/render/{controller}/{action}", get(handlers::render::render))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
