//! In-memory `RecordStore` for router and service tests.

use super::{NewUser, RecordStore, Row, UserRecord, DUPLICATE_EMAIL_MESSAGE};
use crate::config::{ColumnKind, EntityDef, CREATED_AT_COLUMN, ID_COLUMN};
use crate::error::AppError;
use crate::sql::{format_timestamp, SqlValue};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct Tables {
    next_id: i64,
    rows: HashMap<&'static str, Vec<Row>>,
    users: Vec<UserRecord>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    down: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// A store whose every call fails, as if the database were unreachable.
    pub fn failing() -> Self {
        let store = MemoryStore::default();
        store.down.store(true, Ordering::SeqCst);
        store
    }

    /// Put a raw row straight into a table, bypassing validation.
    pub fn seed(&self, entity: &EntityDef, row: Row) {
        let mut tables = self.lock();
        tables.rows.entry(entity.table_name).or_default().push(row);
    }

    pub fn row_count(&self, entity: &EntityDef) -> usize {
        self.lock().rows.get(entity.table_name).map_or(0, Vec::len)
    }

    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(&self) -> Result<(), AppError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(AppError::Db(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self, entity: &EntityDef) -> Result<Vec<Row>, AppError> {
        self.check()?;
        let tables = self.lock();
        let mut rows = tables.rows.get(entity.table_name).cloned().unwrap_or_default();
        rows.reverse();
        Ok(rows)
    }

    async fn insert(&self, entity: &EntityDef, values: &[(&'static str, SqlValue)]) -> Result<Row, AppError> {
        self.check()?;
        let mut tables = self.lock();
        tables.next_id += 1;
        let mut row = Row::new();
        row.insert(ID_COLUMN.to_string(), Value::from(tables.next_id));
        for col in entity.columns {
            let value = match values.iter().find(|(name, _)| *name == col.name) {
                Some((_, v)) => v.to_json(),
                None => match col.kind {
                    ColumnKind::Decimal => SqlValue::Decimal(0.0).to_json(),
                    ColumnKind::Flag => Value::Bool(false),
                    _ => Value::Null,
                },
            };
            row.insert(col.name.to_string(), value);
        }
        row.insert(CREATED_AT_COLUMN.to_string(), Value::String(format_timestamp(&Utc::now())));
        tables.rows.entry(entity.table_name).or_default().push(row.clone());
        Ok(row)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        self.check()?;
        let email = email.to_lowercase();
        let tables = self.lock();
        Ok(tables.users.iter().find(|u| u.email.to_lowercase() == email).cloned())
    }

    async fn insert_user(&self, user: &NewUser) -> Result<UserRecord, AppError> {
        self.check()?;
        let mut tables = self.lock();
        let email = user.email.to_lowercase();
        if tables.users.iter().any(|u| u.email.to_lowercase() == email) {
            return Err(AppError::Conflict(DUPLICATE_EMAIL_MESSAGE.into()));
        }
        tables.next_id += 1;
        let record = UserRecord {
            id: tables.next_id,
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: Utc::now(),
        };
        tables.users.push(record.clone());
        Ok(record)
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.check()
    }

    async fn close(&self) {}
}
