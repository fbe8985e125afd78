//! Data access: the `RecordStore` seam and its PostgreSQL implementation.

use crate::config::EntityDef;
use crate::error::AppError;
use crate::sql::SqlValue;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod schema;

pub use postgres::{ensure_database_exists, PgStore};
pub use schema::ensure_schema;

/// A stored row keyed by storage column name. Timestamps are RFC 3339 strings,
/// detail lists are still the serialized text.
pub type Row = Map<String, Value>;

#[derive(Clone, Debug)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewUser {
    pub name: String,
    /// Already lower-cased and trimmed.
    pub email: String,
    pub password_hash: String,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every row of the entity's table, newest first.
    async fn list(&self, entity: &EntityDef) -> Result<Vec<Row>, AppError>;

    /// Insert one row and return it as stored, atomically.
    async fn insert(&self, entity: &EntityDef, values: &[(&'static str, SqlValue)]) -> Result<Row, AppError>;

    /// Case-insensitive lookup by email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError>;

    /// Insert a user. A second account for the same email is `AppError::Conflict`.
    async fn insert_user(&self, user: &NewUser) -> Result<UserRecord, AppError>;

    /// Round trip to storage, for health checks.
    async fn ping(&self) -> Result<(), AppError>;

    /// Release connections at shutdown.
    async fn close(&self);
}

/// Conflict message shared by the pre-insert check and the unique-index violation.
/// Column widths of `users.name` and `users.email`.
pub const USER_NAME_MAX: usize = 150;
pub const USER_EMAIL_MAX: usize = 255;

pub const DUPLICATE_EMAIL_MESSAGE: &str = "An account with this email already exists.";
