//! Schema bootstrap: idempotent DDL for the record tables and users, generated from the catalog.

use crate::config::{ColumnDef, ColumnKind, EntityDef, CREATED_AT_COLUMN, ENTITIES, ID_COLUMN};
use crate::error::AppError;
use crate::store::{USER_EMAIL_MAX, USER_NAME_MAX};
use sqlx::PgPool;

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn column_def(c: &ColumnDef) -> String {
    let typ = match c.kind {
        ColumnKind::Text {
            max_length: Some(n),
        } => format!("VARCHAR({})", n),
        ColumnKind::Text { max_length: None } | ColumnKind::Details => "TEXT".to_string(),
        ColumnKind::Decimal => "NUMERIC(18,4) NOT NULL DEFAULT 0".to_string(),
        ColumnKind::Flag => "BOOLEAN NOT NULL DEFAULT FALSE".to_string(),
        ColumnKind::Timestamp => "TIMESTAMPTZ".to_string(),
    };
    let mut def = format!("{} {}", quote(c.name), typ);
    let nullable_kind = matches!(c.kind, ColumnKind::Text { .. } | ColumnKind::Details);
    if c.required && nullable_kind {
        def.push_str(" NOT NULL");
    }
    def
}

/// CREATE TABLE and its created_at index for one record kind.
pub fn table_ddl(entity: &EntityDef) -> Vec<String> {
    let mut col_defs = Vec::with_capacity(entity.columns.len() + 2);
    col_defs.push(format!(
        "{} BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY",
        quote(ID_COLUMN)
    ));
    col_defs.extend(entity.columns.iter().map(column_def));
    col_defs.push(format!(
        "{} TIMESTAMPTZ NOT NULL DEFAULT NOW()",
        quote(CREATED_AT_COLUMN)
    ));

    let table = quote(entity.table_name);
    vec![
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
            table,
            col_defs.join(",\n  ")
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ({} DESC)",
            quote(&format!("ix_{}_created_at", entity.table_name)),
            table,
            quote(CREATED_AT_COLUMN)
        ),
    ]
}

pub fn users_ddl() -> Vec<String> {
    vec![
        format!(
            "CREATE TABLE IF NOT EXISTS \"users\" (\n  \
             \"id\" BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,\n  \
             \"name\" VARCHAR({}) NOT NULL,\n  \
             \"email\" VARCHAR({}) NOT NULL,\n  \
             \"password_hash\" VARCHAR(255) NOT NULL,\n  \
             \"created_at\" TIMESTAMPTZ NOT NULL DEFAULT NOW()\n)",
            USER_NAME_MAX, USER_EMAIL_MAX
        ),
        "CREATE UNIQUE INDEX IF NOT EXISTS \"ux_users_email\" ON \"users\" (lower(\"email\"))".to_string(),
    ]
}

/// Every statement needed for a fresh database, in execution order.
pub fn schema_statements() -> Vec<String> {
    let mut stmts = users_ddl();
    for entity in ENTITIES {
        stmts.extend(table_ddl(entity));
    }
    stmts
}

/// Create any missing tables and indexes. Safe to run on every start.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), AppError> {
    for sql in schema_statements() {
        tracing::debug!(%sql, "schema");
        sqlx::query(&sql).execute(pool).await?;
    }
    tracing::info!(tables = ENTITIES.len() + 1, "schema ready");
    Ok(())
}
