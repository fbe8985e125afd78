//! QC records: REST backend for quality-control inspection records on PostgreSQL.

pub mod auth;
pub mod case;
pub mod config;
pub mod cors;
pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use auth::TokenIssuer;
pub use config::{entity_by_path, EntityDef, Settings, ENTITIES};
pub use cors::CorsPolicy;
pub use error::{AppError, AuthError, ConfigError};
pub use routes::app;
pub use state::AppState;
pub use store::{ensure_database_exists, ensure_schema, PgStore, RecordStore};
