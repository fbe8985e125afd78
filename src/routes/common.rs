//! Common routes: health.

use super::route_with_slash;
use crate::handlers::{health, not_found};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn common_routes(state: AppState) -> Router {
    route_with_slash(Router::new(), "/health", get(health).fallback(not_found)).with_state(state)
}
