//! Stored row to API record: camelCase keys, typed numbers and flags, parsed detail lists.

use crate::case::object_keys_to_camel_case;
use crate::config::{ColumnKind, EntityDef, ID_COLUMN};
use crate::service::validation::{to_bool, to_decimal};
use crate::store::Row;
use serde_json::{Number, Value};

/// Whole numbers are emitted as integers so `4` does not come back as `4.0`.
fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or_else(|| Value::from(0))
    }
}

fn details(entity: &EntityDef, row: &Row, raw: Option<&Value>) -> Value {
    let parsed = match raw {
        None | Some(Value::Null) => return Value::Array(Vec::new()),
        Some(Value::Array(items)) => return Value::Array(items.clone()),
        Some(Value::String(s)) => serde_json::from_str::<Value>(s).map_err(|e| e.to_string()),
        Some(other) => Err(format!("unexpected {} value", kind_name(other))),
    };
    match parsed {
        Ok(v @ Value::Array(_)) => v,
        Ok(other) => {
            tracing::warn!(
                entity = entity.name,
                id = ?row.get(ID_COLUMN),
                found = kind_name(&other),
                "stored details are not a list; returning empty list"
            );
            Value::Array(Vec::new())
        }
        Err(error) => {
            tracing::warn!(
                entity = entity.name,
                id = ?row.get(ID_COLUMN),
                %error,
                "stored details could not be parsed; returning empty list"
            );
            Value::Array(Vec::new())
        }
    }
}

fn kind_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Map one stored row to its API shape. Never fails: a malformed detail list
/// is logged and returned as an empty list.
pub fn map_row(entity: &EntityDef, row: &Row) -> Value {
    let mut out = row.clone();
    for column in entity.columns {
        let raw = row.get(column.name);
        let mapped = match column.kind {
            ColumnKind::Decimal => number(raw.map_or(0.0, to_decimal)),
            ColumnKind::Flag => Value::Bool(raw.map_or(false, to_bool)),
            ColumnKind::Details => details(entity, row, raw),
            ColumnKind::Text { .. } | ColumnKind::Timestamp => raw.cloned().unwrap_or(Value::Null),
        };
        out.insert(column.name.to_string(), mapped);
    }
    object_keys_to_camel_case(&mut out);
    Value::Object(out)
}
