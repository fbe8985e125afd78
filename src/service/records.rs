//! List and create for every record kind in the catalog.

use crate::config::EntityDef;
use crate::error::AppError;
use crate::service::mapper::map_row;
use crate::service::validation::validate_submission;
use crate::store::RecordStore;
use serde_json::Value;

pub struct RecordService;

impl RecordService {
    /// Every record of the kind, newest first, in API shape.
    pub async fn list(store: &dyn RecordStore, entity: &EntityDef) -> Result<Vec<Value>, AppError> {
        let rows = store.list(entity).await?;
        Ok(rows.iter().map(|r| map_row(entity, r)).collect())
    }

    /// Validate, insert and return the stored record. Nothing is written when validation fails.
    pub async fn create(store: &dyn RecordStore, entity: &EntityDef, body: &Value) -> Result<Value, AppError> {
        let Value::Object(fields) = body else {
            return Err(AppError::BadRequest("Request body must be a JSON object.".into()));
        };
        let values = validate_submission(entity, fields)?;
        let row = store.insert(entity, &values).await?;
        tracing::info!(entity = entity.name, id = ?row.get("id"), "record created");
        Ok(map_row(entity, &row))
    }
}
