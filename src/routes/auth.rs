//! Account routes under `/auth`.

use super::route_with_slash;
use crate::handlers::auth::{forgot_password, login, register};
use crate::handlers::not_found;
use crate::state::AppState;
use axum::{routing::post, Router};

pub fn auth_routes(state: AppState) -> Router {
    let router = route_with_slash(Router::new(), "/auth/login", post(login).fallback(not_found));
    let router = route_with_slash(router, "/auth/register", post(register).fallback(not_found));
    route_with_slash(router, "/auth/forgot-password", post(forgot_password).fallback(not_found)).with_state(state)
}
