//! HTTP handlers for records, accounts and health.

pub mod auth;
pub mod entity;
pub mod health;
pub use health::{health, not_found};
