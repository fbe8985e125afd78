//! Typed values bound to statements, and their conversion to sqlx arguments.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::Arguments;

/// A value bound to a PostgreSQL statement. Nulls keep their column type so the
/// server never has to guess a parameter type.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Text(Option<String>),
    Decimal(f64),
    Flag(bool),
    Timestamp(Option<DateTime<Utc>>),
}

impl SqlValue {
    /// JSON form of the value as it reads back from storage.
    pub fn to_json(&self) -> Value {
        match self {
            SqlValue::Text(Some(s)) => Value::String(s.clone()),
            SqlValue::Text(None) | SqlValue::Timestamp(None) => Value::Null,
            SqlValue::Decimal(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            SqlValue::Flag(b) => Value::Bool(*b),
            SqlValue::Timestamp(Some(t)) => Value::String(format_timestamp(t)),
        }
    }
}

/// RFC 3339 in UTC with millisecond precision, e.g. `2024-05-01T08:30:00.000Z`.
pub fn format_timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Inputs for a statement written with `@name` markers, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct NamedParams {
    entries: Vec<(String, SqlValue)>,
}

impl NamedParams {
    pub fn new() -> Self {
        NamedParams::default()
    }

    /// Declare (or replace) the value for `@name`.
    pub fn input(mut self, name: impl Into<String>, value: SqlValue) -> Self {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }
}

/// Statement text with positional (`$n`) placeholders and the values in bind order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl QueryBuf {
    /// Build sqlx arguments in placeholder order.
    pub fn arguments(&self) -> Result<PgArguments, sqlx::Error> {
        let mut args = PgArguments::default();
        for p in &self.params {
            let added = match p {
                SqlValue::Text(v) => args.add(v.clone()),
                SqlValue::Decimal(n) => args.add(*n),
                SqlValue::Flag(b) => args.add(*b),
                SqlValue::Timestamp(t) => args.add(*t),
            };
            added.map_err(sqlx::Error::Encode)?;
        }
        Ok(args)
    }
}
