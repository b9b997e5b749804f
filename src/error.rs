use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::jwt::TokenError;
use crate::store::StoreError;

/// Error type returned by handlers and services. Every variant maps to one
/// HTTP status and one stable machine-readable code.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Username already taken")]
    DuplicateUsername,

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Missing bearer token")]
    MissingToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Old password does not match")]
    IncorrectPassword,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::DuplicateUsername
            | ApiError::DuplicateEmail
            | ApiError::IncorrectPassword
            | ApiError::Validation(_) => StatusCode::BAD_REQUEST,

            ApiError::InvalidCredentials
            | ApiError::ExpiredToken
            | ApiError::InvalidToken
            | ApiError::MissingToken => StatusCode::UNAUTHORIZED,

            ApiError::UserNotFound => StatusCode::NOT_FOUND,

            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable code carried in the response body, independent of the message.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::DuplicateUsername => "duplicate_username",
            ApiError::DuplicateEmail => "duplicate_email",
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::ExpiredToken => "expired_token",
            ApiError::InvalidToken => "invalid_token",
            ApiError::MissingToken => "missing_token",
            ApiError::UserNotFound => "user_not_found",
            ApiError::IncorrectPassword => "incorrect_password",
            ApiError::Validation(_) => "validation_error",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Internal causes stay in the log; the client gets a generic message.
        let message = match &self {
            ApiError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorBody {
            error: self.code(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername => ApiError::DuplicateUsername,
            StoreError::DuplicateEmail => ApiError::DuplicateEmail,
            StoreError::NotFound => ApiError::UserNotFound,
            StoreError::Database(e) => ApiError::Internal(anyhow::Error::new(e)),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => ApiError::ExpiredToken,
            TokenError::Invalid => ApiError::InvalidToken,
        }
    }
}
