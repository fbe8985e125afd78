//! Submission validation and input coercion, driven by the entity catalog.

use crate::config::{ColumnDef, ColumnKind, EntityDef};
use crate::error::AppError;
use crate::sql::SqlValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

/// Decimal columns are `NUMERIC(18,4)`: magnitudes from here up do not fit.
const DECIMAL_LIMIT: f64 = 1e14;

/// Lenient numeric coercion. Never fails: anything that is not a finite number
/// (after trimming, for strings) becomes 0. Booleans count as 1 and 0.
pub fn to_decimal(v: &Value) -> f64 {
    let n = match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// Strict boolean coercion: only `true`, `"true"`, `"1"` and non-zero numbers are true.
pub fn to_bool(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("true") || s == "1"
        }
        _ => false,
    }
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM[:SS[.fff]]` and `YYYY-MM-DD`. Values without
/// an offset are taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(t.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
}

/// Text form of a scalar input. `None` for null, blank strings, objects and arrays.
fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn is_present(body: &Map<String, Value>, column: &ColumnDef) -> bool {
    match (column.kind, body.get(&column.api_name())) {
        (ColumnKind::Details, Some(Value::Array(items))) => !items.is_empty(),
        (ColumnKind::Details, _) => false,
        (_, None | Some(Value::Null)) => false,
        (_, Some(Value::String(s))) => !s.trim().is_empty(),
        (_, Some(_)) => true,
    }
}

fn text_value(field: &str, v: Option<&Value>, max_length: Option<u32>) -> Result<SqlValue, AppError> {
    let Some(v) = v else {
        return Ok(SqlValue::Text(None));
    };
    if v.is_object() || v.is_array() {
        return Err(AppError::Validation(format!("{} must be text.", field)));
    }
    let text = scalar_text(v);
    if text.as_deref().map_or(false, |t| t.contains('\0')) {
        return Err(AppError::Validation(format!("{} must not contain NUL characters.", field)));
    }
    if let (Some(t), Some(max)) = (&text, max_length) {
        if t.chars().count() > max as usize {
            return Err(AppError::Validation(format!(
                "{} must be at most {} characters.",
                field, max
            )));
        }
    }
    Ok(SqlValue::Text(text))
}

fn decimal_value(field: &str, v: Option<&Value>) -> Result<SqlValue, AppError> {
    let n = v.map_or(0.0, to_decimal);
    if n.abs() >= DECIMAL_LIMIT {
        return Err(AppError::Validation(format!("{} is out of range.", field)));
    }
    Ok(SqlValue::Decimal(n))
}

fn timestamp_value(field: &str, v: Option<&Value>) -> Result<SqlValue, AppError> {
    match v {
        None | Some(Value::Null) => Ok(SqlValue::Timestamp(None)),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(SqlValue::Timestamp(None)),
        Some(Value::String(s)) => parse_timestamp(s)
            .map(|t| SqlValue::Timestamp(Some(t)))
            .ok_or_else(|| AppError::Validation(format!("{} must be a valid date.", field))),
        Some(_) => Err(AppError::Validation(format!("{} must be a valid date.", field))),
    }
}

/// Check a create body against the entity and coerce it into column values, in
/// catalog order. Missing required data is reported with the entity's message
/// before any per-field check runs.
pub fn validate_submission(
    entity: &EntityDef,
    body: &Map<String, Value>,
) -> Result<Vec<(&'static str, SqlValue)>, AppError> {
    if entity
        .columns
        .iter()
        .any(|c| c.required && !is_present(body, c))
    {
        return Err(AppError::Validation(entity.required_message.to_string()));
    }

    let mut values = Vec::with_capacity(entity.columns.len());
    for column in entity.columns {
        let field = column.api_name();
        let raw = body.get(&field);
        let value = match column.kind {
            ColumnKind::Text { max_length } => text_value(&field, raw, max_length)?,
            ColumnKind::Decimal => decimal_value(&field, raw)?,
            ColumnKind::Flag => SqlValue::Flag(raw.map_or(false, to_bool)),
            ColumnKind::Timestamp => timestamp_value(&field, raw)?,
            ColumnKind::Details => {
                let items = raw.cloned().unwrap_or_else(|| Value::Array(Vec::new()));
                let text = serde_json::to_string(&items)
                    .map_err(|e| AppError::Internal(format!("serialize {}: {}", field, e)))?;
                SqlValue::Text(Some(text))
            }
        };
        values.push((column.name, value));
    }
    Ok(values)
}
