//! Router assembly: `/api` routes, JSON 404 fallback, CORS, request tracing.

mod auth;
mod common;
mod entity;

pub use auth::auth_routes;
pub use common::common_routes;
pub use entity::entity_routes;

use crate::cors::{reject_disallowed_origin, CorsPolicy};
use crate::handlers::not_found;
use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, middleware, routing::MethodRouter, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Largest accepted request body. Larger bodies fail JSON extraction and answer 413.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Serve `path` and `path/` with the same handlers.
fn route_with_slash<S>(router: Router<S>, path: &str, handlers: MethodRouter<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .route(path, handlers.clone())
        .route(&format!("{}/", path), handlers)
}

/// The whole service. Layers run outermost first: tracing, origin check, CORS, body limit.
pub fn app(state: AppState, cors: CorsPolicy) -> Router {
    let cors = Arc::new(cors);
    let api = Router::new()
        .merge(common_routes(state.clone()))
        .merge(auth_routes(state.clone()))
        .merge(entity_routes(state));

    Router::new()
        .nest("/api", api)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors.layer())
        .layer(middleware::from_fn_with_state(cors, reject_disallowed_origin))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests;
