//! Builds list and insert statements from the entity catalog. Identifiers come
//! from the catalog only; values are always `@name` markers resolved by the dialect layer.

use crate::config::{ColumnKind, EntityDef, CREATED_AT_COLUMN, ID_COLUMN};
use crate::sql::params::{NamedParams, SqlValue};

/// Quote identifier for PostgreSQL (safe: only from the catalog).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// SELECT list: id, catalog columns, created_at. Numeric columns come back as float8
/// so they decode straight into `f64`.
pub fn select_column_list(entity: &EntityDef) -> String {
    let mut cols = Vec::with_capacity(entity.columns.len() + 2);
    cols.push(quoted(ID_COLUMN));
    for c in entity.columns {
        let q = quoted(c.name);
        if c.kind == ColumnKind::Decimal {
            cols.push(format!("{}::float8 AS {}", q, q));
        } else {
            cols.push(q);
        }
    }
    cols.push(quoted(CREATED_AT_COLUMN));
    cols.join(", ")
}

/// Every row, newest first. `id` breaks ties between rows created in the same instant.
pub fn select_list(entity: &EntityDef) -> String {
    format!(
        "SELECT {} FROM {} ORDER BY {} DESC, {} DESC",
        select_column_list(entity),
        quoted(entity.table_name),
        quoted(CREATED_AT_COLUMN),
        quoted(ID_COLUMN)
    )
}

/// INSERT ... RETURNING: the inserted row comes back from the same statement,
/// so a create can never pick up a row written by a concurrent request.
pub fn insert_returning(entity: &EntityDef, values: &[(&'static str, SqlValue)]) -> (String, NamedParams) {
    let mut params = NamedParams::new();
    let mut cols = Vec::with_capacity(values.len());
    let mut markers = Vec::with_capacity(values.len());
    for (name, value) in values {
        let Some(column) = entity.column(name) else {
            continue;
        };
        cols.push(quoted(column.name));
        markers.push(match column.kind {
            ColumnKind::Decimal => format!("@{}::numeric", column.name),
            _ => format!("@{}", column.name),
        });
        params = params.input(column.name, value.clone());
    }
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quoted(entity.table_name),
        cols.join(", "),
        markers.join(", "),
        select_column_list(entity)
    );
    (sql, params)
}

pub const USER_COLUMNS: &str = "id, name, email, password_hash, created_at";

pub fn select_user_by_email() -> String {
    format!(
        "SELECT {} FROM users WHERE lower(email) = lower(@email) LIMIT 1",
        USER_COLUMNS
    )
}

pub fn insert_user() -> String {
    format!(
        "INSERT INTO users (name, email, password_hash) VALUES (@name, @email, @passwordHash) RETURNING {}",
        USER_COLUMNS
    )
}
