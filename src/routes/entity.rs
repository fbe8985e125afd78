//! Record routes. One parameterized path serves every kind; the handler resolves
//! the segment against the catalog and answers 404 for anything else.

use super::route_with_slash;
use crate::handlers::entity::{create, list};
use crate::handlers::not_found;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn entity_routes(state: AppState) -> Router {
    route_with_slash(Router::new(), "/:path_segment", get(list).post(create).fallback(not_found)).with_state(state)
}
