//! Cross-origin policy: a fixed allow-list plus hosted development workspaces.
//! Requests from any other origin are refused with 403 before routing.

use crate::error::AppError;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use regex::Regex;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

const WORKSPACE_ORIGIN: &str = r"^https://port\d+-workspaces-[\w-]+\.([\w-]+\.)*cloud\.sap$";

#[derive(Debug)]
pub struct CorsPolicy {
    origins: Vec<String>,
    workspace: Regex,
}

impl CorsPolicy {
    pub fn new(origins: Vec<String>) -> Self {
        CorsPolicy {
            origins,
            workspace: Regex::new(WORKSPACE_ORIGIN).expect("valid pattern"),
        }
    }

    pub fn allows(&self, origin: &str) -> bool {
        self.origins.iter().any(|o| o == origin) || self.workspace.is_match(origin)
    }

    fn allows_header(&self, origin: &HeaderValue) -> bool {
        origin.to_str().map_or(false, |o| self.allows(o))
    }

    /// Preflight and response headers for allowed origins.
    pub fn layer(self: &Arc<Self>) -> CorsLayer {
        let policy = Arc::clone(self);
        CorsLayer::new()
            .allow_origin(AllowOrigin::predicate(move |origin, _| policy.allows_header(origin)))
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    }
}

/// Refuse requests that carry an `Origin` outside the policy. Requests without
/// one (curl, server-to-server) pass.
pub async fn reject_disallowed_origin(State(policy): State<Arc<CorsPolicy>>, req: Request, next: Next) -> Response {
    if let Some(origin) = req.headers().get(header::ORIGIN) {
        if !policy.allows_header(origin) {
            tracing::warn!(origin = ?origin, path = %req.uri().path(), "origin rejected");
            return AppError::Forbidden("Not allowed by CORS".into()).into_response();
        }
    }
    next.run(req).await
}
