//! PostgreSQL-backed `RecordStore`. Every statement goes through the dialect
//! layer, which turns `@name` markers into positional parameters.

use super::{NewUser, RecordStore, Row, UserRecord, DUPLICATE_EMAIL_MESSAGE};
use crate::config::{ColumnKind, EntityDef, CREATED_AT_COLUMN, ID_COLUMN};
use crate::error::AppError;
use crate::sql::{format_timestamp, insert_returning, insert_user, select_list, select_user_by_email, translate, NamedParams, QueryBuf, SqlValue};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{ConnectOptions, PgPool, Row as _};
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32, acquire_timeout: Duration) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;
        Ok(PgStore::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn prepare(sql: &str, params: &NamedParams) -> QueryBuf {
        let q = translate(sql, params);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        q
    }

    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<PgRow>, AppError> {
        let rows = sqlx::query_with(&q.sql, q.arguments()?)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<PgRow>, AppError> {
        let row = sqlx::query_with(&q.sql, q.arguments()?)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn list(&self, entity: &EntityDef) -> Result<Vec<Row>, AppError> {
        let q = Self::prepare(&select_list(entity), &NamedParams::new());
        let rows = self.fetch_all(&q).await?;
        rows.iter().map(|r| row_to_json(entity, r)).collect()
    }

    async fn insert(&self, entity: &EntityDef, values: &[(&'static str, SqlValue)]) -> Result<Row, AppError> {
        let (sql, params) = insert_returning(entity, values);
        let q = Self::prepare(&sql, &params);
        let row = self
            .fetch_optional(&q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))?;
        row_to_json(entity, &row)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let params = NamedParams::new().input("email", SqlValue::Text(Some(email.to_string())));
        let q = Self::prepare(&select_user_by_email(), &params);
        let row = self.fetch_optional(&q).await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn insert_user(&self, user: &NewUser) -> Result<UserRecord, AppError> {
        let params = NamedParams::new()
            .input("name", SqlValue::Text(Some(user.name.clone())))
            .input("email", SqlValue::Text(Some(user.email.clone())))
            .input("passwordHash", SqlValue::Text(Some(user.password_hash.clone())));
        let q = Self::prepare(&insert_user(), &params);
        let row = match self.fetch_optional(&q).await {
            Ok(row) => row,
            Err(AppError::Db(sqlx::Error::Database(e))) if e.is_unique_violation() => {
                return Err(AppError::Conflict(DUPLICATE_EMAIL_MESSAGE.into()));
            }
            Err(e) => return Err(e),
        };
        let row = row.ok_or(AppError::Db(sqlx::Error::RowNotFound))?;
        user_from_row(&row)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Decode a row using the entity's column kinds.
fn row_to_json(entity: &EntityDef, row: &PgRow) -> Result<Row, AppError> {
    let mut map = Row::new();
    let id: i64 = row.try_get(ID_COLUMN)?;
    map.insert(ID_COLUMN.to_string(), Value::from(id));
    for col in entity.columns {
        let name = col.name;
        let v = match col.kind {
            ColumnKind::Text { .. } | ColumnKind::Details => row
                .try_get::<Option<String>, _>(name)?
                .map(Value::String)
                .unwrap_or(Value::Null),
            ColumnKind::Decimal => row
                .try_get::<Option<f64>, _>(name)?
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ColumnKind::Flag => row
                .try_get::<Option<bool>, _>(name)?
                .map(Value::Bool)
                .unwrap_or(Value::Null),
            ColumnKind::Timestamp => row
                .try_get::<Option<DateTime<Utc>>, _>(name)?
                .map(|t| Value::String(format_timestamp(&t)))
                .unwrap_or(Value::Null),
        };
        map.insert(name.to_string(), v);
    }
    let created_at: DateTime<Utc> = row.try_get(CREATED_AT_COLUMN)?;
    map.insert(CREATED_AT_COLUMN.to_string(), Value::String(format_timestamp(&created_at)));
    Ok(map)
}

fn user_from_row(row: &PgRow) -> Result<UserRecord, AppError> {
    Ok(UserRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url);
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

/// Admin URL on the `postgres` database and the target database name (empty when the URL has no path).
fn parse_db_name_from_url(url: &str) -> (String, String) {
    let (location, query) = match url.split_once('?') {
        Some((location, query)) => (location, Some(query)),
        None => (url, None),
    };
    let authority_start = location.find("://").map_or(0, |i| i + 3);
    let Some(slash) = location.get(authority_start..).and_then(|rest| rest.rfind('/')) else {
        return (url.to_string(), String::new());
    };
    let path_start = authority_start + slash + 1;
    let db_name = location.get(path_start..).unwrap_or("").trim();
    let base = location.get(..path_start).unwrap_or(location);
    let admin_url = match query {
        Some(q) => format!("{}postgres?{}", base, q),
        None => format!("{}postgres", base),
    };
    (admin_url, db_name.to_string())
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
