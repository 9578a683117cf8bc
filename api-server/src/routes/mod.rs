//! Route handlers

pub mod dashboard;
pub mod health;
pub mod preferences;
pub mod project;
pub mod task;

use axum::{http::StatusCode, Json};
use serde::Serialize;
use taskflow_core::Error;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<T, ApiError>;

pub fn error_response(err: Error) -> ApiError {
    let status = match &err {
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        e if e.is_not_found() => StatusCode::NOT_FOUND,
        Error::Remote(_) | Error::Transport(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("Request failed: {}", err);
    }
    (
        status,
        Json(ErrorResponse {
            error: err.user_message(),
        }),
    )
}

pub fn confirmation_required(what: &str) -> ApiError {
    (
        StatusCode::PRECONDITION_REQUIRED,
        Json(ErrorResponse {
            error: format!("Deleting a {} requires confirm=true", what),
        }),
    )
}
