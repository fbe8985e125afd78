//! Shared application state for all routes.

use crate::auth::TokenIssuer;
use crate::store::RecordStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub tokens: Arc<TokenIssuer>,
    pub password_min_length: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, tokens: TokenIssuer, password_min_length: usize) -> Self {
        AppState {
            store,
            tokens: Arc::new(tokens),
            password_min_length,
        }
    }
}
