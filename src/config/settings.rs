//! Server settings from the environment (a `.env` file is loaded first by the binary).

use crate::error::ConfigError;
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/qc_records";
const DEFAULT_JWT_SECRET: &str = "change-this-secret-in-production";

/// Origins always allowed by CORS, on top of `ALLOWED_ORIGINS`.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &["http://localhost:4200", "http://localhost:3100"];

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Create the target database when it does not exist yet.
    pub create_database: bool,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub allowed_origins: Vec<String>,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub password_min_length: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET is not set; using the built-in development secret");
                DEFAULT_JWT_SECRET.to_string()
            }
        };

        let mut allowed_origins: Vec<String> =
            DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect();
        if let Some(extra) = get("ALLOWED_ORIGINS") {
            allowed_origins.extend(
                extra
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from),
            );
        }

        Ok(Settings {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or("PORT", get("PORT"), 3100)?,
            create_database: parse_flag("CREATE_DATABASE", get("CREATE_DATABASE"), true)?,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), 5)?,
            db_acquire_timeout: Duration::from_secs(parse_or(
                "DB_ACQUIRE_TIMEOUT_SECS",
                get("DB_ACQUIRE_TIMEOUT_SECS"),
                10,
            )?),
            allowed_origins,
            jwt_secret,
            token_ttl_minutes: parse_or("TOKEN_TTL_MINUTES", get("TOKEN_TTL_MINUTES"), 60)?,
            password_min_length: parse_or("PASSWORD_MIN_LENGTH", get("PASSWORD_MIN_LENGTH"), 8)?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn parse_flag(key: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(_) => Err(ConfigError::Invalid {
            key,
            value: raw.unwrap_or_default(),
        }),
    }
}
