// crates/server/src/lib.rs
//! Yearbook server library.
//!
//! Axum HTTP server for GitHub yearbook statistics: the aggregation
//! pipeline (cache, staleness probe, fetch, normalize) plus token storage,
//! visit analytics and SVG card rendering.

pub mod aggregate;
pub mod card;
pub mod error;
pub mod routes;
pub mod state;

pub use aggregate::{AggregationError, AggregationService, StatsOutcome};
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use yearbook_db::Database;
use yearbook_github::GithubClient;

/// Create the Axum application with all routes and middleware.
///
/// CORS allows any origin: the card and stats endpoints are meant to be
/// embedded from arbitrary pages.
pub fn create_app(db: Database, github: GithubClient) -> Router {
    let state = Arc::new(AppState::new(db, github));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
