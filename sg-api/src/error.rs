use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sg_core::StoreError;

/// Body text for failures whose detail stays in the server log.
pub const UNEXPECTED_ERROR: &str = "Unexpected server error";

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    StoreError(StoreError),
    Unexpected(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::StoreError(err) => {
                tracing::error!("Store read failed: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.message().to_string())
            }
            AppError::Unexpected(err) => {
                tracing::error!("Unexpected server error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, UNEXPECTED_ERROR.to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::StoreError(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Unexpected(err)
    }
}

/// Turns a handler panic into the generic 500 body.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");

    AppError::Unexpected(anyhow::anyhow!("handler panicked: {}", detail)).into_response()
}
