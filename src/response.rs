//! Response body helpers.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct MessageBody {
    pub message: String,
}

#[derive(Serialize, Debug)]
pub struct Profile {
    pub name: String,
    pub email: String,
}

#[derive(Serialize, Debug)]
pub struct LoginBody {
    pub message: &'static str,
    pub token: String,
    pub profile: Profile,
}

#[derive(Serialize, Debug)]
pub struct HealthBody {
    pub status: &'static str,
    pub message: &'static str,
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(data))
}

pub fn ok<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(data))
}

pub fn message(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<MessageBody>) {
    (
        status,
        Json(MessageBody {
            message: message.into(),
        }),
    )
}
