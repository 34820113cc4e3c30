//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// No valid session
    #[error("Unauthorized")]
    Unauthorized,

    /// Session is valid but the user is not a member of the target clinic
    #[error("Forbidden")]
    Forbidden,

    /// Entity does not exist in the target clinic
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Payload rejected before reaching storage
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Failure outside storage, e.g. an unreachable backend
    #[error("Internal server error")]
    InternalServerError,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            ApiError::NotFound(entity) => (StatusCode::NOT_FOUND, format!("{} not found", entity)),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            ApiError::Database(DatabaseError::UniqueViolation { constraint }) => {
                error!("Unique constraint rejected write: {}", constraint);
                (StatusCode::CONFLICT, "Record already exists".to_string())
            }
            ApiError::Database(DatabaseError::ForeignKeyViolation { constraint }) => {
                error!("Foreign key rejected write: {}", constraint);
                (
                    StatusCode::NOT_FOUND,
                    "Referenced record not found".to_string(),
                )
            }
            ApiError::Database(e) => {
                error!("Database failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
