use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::AccountError;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    /// All accumulated form errors, surfaced together.
    ValidationError(Vec<String>),

    Conflict(String),

    Unauthorized(String),

    /// Malformed identity reference or a token that fails verification.
    BadLink(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::ValidationError(msgs) => {
                write!(f, "Validation error: {}", msgs.join("; "))
            }
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::BadLink(msg) => write!(f, "Bad link: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiResponse::<()>::error(msg)),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::<()>::error("A database error occurred"),
                )
            }
            ApiError::ValidationError(msgs) => {
                (StatusCode::BAD_REQUEST, ApiResponse::<()>::errors(msgs))
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, ApiResponse::<()>::error(msg)),
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, ApiResponse::<()>::error(msg))
            }
            ApiError::BadLink(msg) => (StatusCode::BAD_REQUEST, ApiResponse::<()>::error(msg)),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::<()>::error("An internal error occurred"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

/// Flow-neutral mapping; handlers that need link-flavored wording
/// (activation vs reset) match the error themselves first.
impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::EmailTaken => ApiError::Conflict("Email already exists".to_string()),
            AccountError::InvalidLink | AccountError::InvalidToken => {
                ApiError::BadLink("The link is invalid or has expired.".to_string())
            }
            AccountError::NoSuchAccount => {
                ApiError::NotFound("No user is associated with this email.".to_string())
            }
            AccountError::AccountNotActivated => ApiError::Unauthorized(
                "Account is not activated. Please check your email.".to_string(),
            ),
            AccountError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid email or password.".to_string())
            }
            AccountError::Validation(msg) => ApiError::ValidationError(vec![msg]),
            AccountError::Mail(msg) => ApiError::InternalError(format!("Mail delivery failed: {msg}")),
            AccountError::Database(msg) => ApiError::DatabaseError(msg),
            AccountError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![msg.into()])
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}
