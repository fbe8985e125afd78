//! Record handlers: list and create for any kind in the catalog, resolved by path segment.

use crate::config::{entity_by_path, EntityDef};
use crate::error::AppError;
use crate::response::created;
use crate::service::RecordService;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

fn resolve_entity(path_segment: &str) -> Result<&'static EntityDef, AppError> {
    entity_by_path(path_segment).ok_or(AppError::NotFound)
}

pub async fn list(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
) -> Result<Json<Vec<Value>>, AppError> {
    let entity = resolve_entity(&path_segment)?;
    let records = RecordService::list(state.store.as_ref(), entity).await?;
    Ok(Json(records))
}

pub async fn create(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let entity = resolve_entity(&path_segment)?;
    let Json(body) = body?;
    let record = RecordService::create(state.store.as_ref(), entity, &body).await?;
    Ok(created(record))
}
