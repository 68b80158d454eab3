// src/error.rs
use crate::models::response::ErrorResponse;
use axum::{http::StatusCode, Json};
use thiserror::Error;

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub type ApiResult<T> = Result<T, ApiError>;

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            success: false,
            code: status.as_u16(),
            message: message.into(),
        }),
    )
}

pub fn bad_request(message: impl Into<String>) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, message)
}

pub fn not_found(message: impl Into<String>) -> ApiError {
    api_error(StatusCode::NOT_FOUND, message)
}

pub fn forbidden(message: impl Into<String>) -> ApiError {
    api_error(StatusCode::FORBIDDEN, message)
}

pub fn unauthorized(message: impl Into<String>) -> ApiError {
    api_error(StatusCode::UNAUTHORIZED, message)
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Password hashing error: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let error_id = uuid::Uuid::new_v4();
        tracing::error!(error_id = %error_id, error = %err, "internal error");
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Internal server error (ID: {})", error_id),
        )
    }
}

/// Maps a bare sqlx error straight into the handler error type.
pub fn db_error(err: sqlx::Error) -> ApiError {
    AppError::from(err).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_errors_hide_details() {
        let (status, Json(body)) = ApiError::from(AppError::Database(sqlx::Error::RowNotFound));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, 500);
        assert!(!body.success);
        assert!(body.message.starts_with("Internal server error (ID: "));
        assert!(!body.message.contains("RowNotFound"));
    }

    #[test]
    fn test_helpers_set_matching_code() {
        let (status, Json(body)) = forbidden("nope");
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.code, 403);
        assert_eq!(body.message, "nope");
    }
}
