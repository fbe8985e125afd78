//! Account handlers: login, register, forgot-password.

use crate::error::AppError;
use crate::response::{message, ok, LoginBody, MessageBody};
use crate::service::AccountService;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<LoginBody>), AppError> {
    let Json(body) = body?;
    let login = AccountService::login(state.store.as_ref(), &state.tokens, &body).await?;
    Ok(ok(login))
}

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageBody>), AppError> {
    let Json(body) = body?;
    AccountService::register(state.store.as_ref(), state.password_min_length, &body).await?;
    Ok(message(StatusCode::CREATED, "Account created successfully."))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageBody>), AppError> {
    let Json(body) = body?;
    let text = AccountService::forgot_password(state.store.as_ref(), &body).await?;
    Ok(message(StatusCode::OK, text))
}
