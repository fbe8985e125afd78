//! Health check with a database round trip, plus the JSON 404.

use crate::error::AppError;
use crate::response::HealthBody;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthBody>) {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthBody {
                status: "ok",
                message: "Database connection successful.",
            }),
        ),
        Err(e) => {
            tracing::error!(error = ?e, "health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthBody {
                    status: "error",
                    message: "Database connection failed.",
                }),
            )
        }
    }
}

pub async fn not_found() -> AppError {
    AppError::NotFound
}
