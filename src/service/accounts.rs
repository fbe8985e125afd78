//! Account operations: register, login, forgot-password.

use crate::auth::{hash_password, verify_password, TokenIssuer};
use crate::error::{AppError, AuthError};
use crate::response::{LoginBody, Profile};
use crate::store::{NewUser, RecordStore, DUPLICATE_EMAIL_MESSAGE, USER_EMAIL_MAX, USER_NAME_MAX};
use serde_json::Value;
use std::sync::OnceLock;

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials. Please try again.";
pub const RESET_SENT_MESSAGE: &str = "If an account exists, password reset instructions were sent.";

/// Non-blank string field, trimmed.
fn text_field<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Passwords are taken verbatim; only an empty one counts as missing.
fn password_field<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Values written to or looked up in `users` must fit the column and carry no NUL.
fn check_column_text(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    if value.contains('\0') {
        return Err(AppError::BadRequest(format!("{} must not contain NUL characters.", field)));
    }
    if value.chars().count() > max {
        return Err(AppError::BadRequest(format!("{} must be at most {} characters.", field, max)));
    }
    Ok(())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Run Argon2 work on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(AppError::from)
}

/// Verified against on the unknown-account path so it costs the same Argon2 work
/// as a wrong password.
fn dummy_hash() -> Result<&'static str, AuthError> {
    static DUMMY: OnceLock<String> = OnceLock::new();
    if let Some(hash) = DUMMY.get() {
        return Ok(hash);
    }
    let hash = hash_password("qc-records-unknown-account")?;
    Ok(DUMMY.get_or_init(|| hash))
}

pub struct AccountService;

impl AccountService {
    pub async fn login(store: &dyn RecordStore, tokens: &TokenIssuer, body: &Value) -> Result<LoginBody, AppError> {
        let (Some(email), Some(password)) = (text_field(body, "email"), password_field(body, "password")) else {
            return Err(AppError::BadRequest("Email and password are required.".into()));
        };
        check_column_text("email", email, USER_EMAIL_MAX)?;
        let email = normalize_email(email);
        let password = password.to_string();
        let Some(user) = store.find_user_by_email(&email).await? else {
            if let Err(error) = blocking(move || dummy_hash().and_then(|h| verify_password(&password, h))).await {
                tracing::warn!(%error, "dummy password check failed");
            }
            tracing::info!("login rejected: unknown account");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS_MESSAGE.into()));
        };

        let hash = user.password_hash.clone();
        let matches = blocking(move || verify_password(&password, &hash)).await?;
        if !matches {
            tracing::info!(user_id = user.id, "login rejected: wrong password");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS_MESSAGE.into()));
        }

        let token = tokens.issue(&user.email, &user.name)?;
        tracing::info!(user_id = user.id, "login succeeded");
        Ok(LoginBody {
            message: "Login successful.",
            token,
            profile: Profile {
                name: user.name,
                email: user.email,
            },
        })
    }

    pub async fn register(store: &dyn RecordStore, password_min_length: usize, body: &Value) -> Result<(), AppError> {
        let (Some(name), Some(email), Some(password)) = (
            text_field(body, "name"),
            text_field(body, "email"),
            password_field(body, "password"),
        ) else {
            return Err(AppError::BadRequest("Name, email and password are required.".into()));
        };
        check_column_text("name", name, USER_NAME_MAX)?;
        check_column_text("email", email, USER_EMAIL_MAX)?;
        if password.chars().count() < password_min_length {
            return Err(AppError::BadRequest(format!(
                "Password must be at least {} characters.",
                password_min_length
            )));
        }

        let email = normalize_email(email);
        if store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(DUPLICATE_EMAIL_MESSAGE.into()));
        }

        let password = password.to_string();
        let password_hash = blocking(move || hash_password(&password)).await?;
        let user = store
            .insert_user(&NewUser {
                name: name.to_string(),
                email,
                password_hash,
            })
            .await?;
        tracing::info!(user_id = user.id, "account created");
        Ok(())
    }

    /// Same answer whether or not the account exists.
    pub async fn forgot_password(store: &dyn RecordStore, body: &Value) -> Result<&'static str, AppError> {
        let Some(email) = text_field(body, "email") else {
            return Err(AppError::BadRequest("Email is required.".into()));
        };
        check_column_text("email", email, USER_EMAIL_MAX)?;
        let found = store.find_user_by_email(&normalize_email(email)).await?.is_some();
        tracing::debug!(found, "password reset requested");
        Ok(RESET_SENT_MESSAGE)
    }
}
