use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::repositories::RepositoryError;
use crate::services::email_service::EmailError;
use crate::services::hashing_service::HashError;
use crate::services::token_service::TokenError;

// Type alias for Result with our AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Category of a failed auth operation. Each kind maps to exactly one HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    NotFound,
    Conflict,
    Internal,
}

impl ErrorKind {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error returned by every domain operation.
///
/// Carries the machine-readable kind (and through it the status code) together with the
/// message shown to the client. Handlers forward it untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn internal() -> Self {
        Self::new(ErrorKind::Internal, "Internal server error")
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> StatusCode {
        self.kind.status_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = json!({ "message": self.message });
        (self.kind.status_code(), Json(body)).into_response()
    }
}

// Conversion traits. Internal failures are logged here with their detail and surfaced with a
// generic message.
impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => AppError::not_found("Record not found"),
            RepositoryError::AlreadyExists => AppError::conflict("Email already registered"),
            RepositoryError::Database(e) => {
                tracing::error!(error = %e, "Database operation failed");
                AppError::internal()
            }
            RepositoryError::Corrupt(msg) => {
                tracing::error!(detail = %msg, "Stored record could not be decoded");
                AppError::internal()
            }
            RepositoryError::InvalidTtl(minutes) => {
                tracing::error!(ttl_minutes = minutes, "Activation lifetime out of range");
                AppError::internal()
            }
        }
    }
}

impl From<HashError> for AppError {
    fn from(err: HashError) -> Self {
        match err {
            HashError::Mismatch => AppError::unauthorized("Invalid credentials"),
            HashError::Hashing(msg) => {
                tracing::error!(detail = %msg, "Hashing failed");
                AppError::internal()
            }
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid | TokenError::Expired | TokenError::WrongType => {
                AppError::unauthorized("Invalid or expired token")
            }
            TokenError::Signing(msg) => {
                tracing::error!(detail = %msg, "Token signing failed");
                AppError::internal()
            }
            TokenError::Entropy(msg) => {
                tracing::error!(detail = %msg, "Random source failed");
                AppError::internal()
            }
        }
    }
}

impl From<EmailError> for AppError {
    fn from(err: EmailError) -> Self {
        tracing::error!(error = %err, "Email delivery failed");
        AppError::new(ErrorKind::Internal, "Failed to send email")
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "Rejected request body");
        AppError::bad_request("Invalid request format")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_maps_to_status() {
        assert_eq!(AppError::bad_request("x").code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::unauthorized("x").code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::not_found("x").code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::conflict("x").code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::internal().code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_errors_convert() {
        assert_eq!(
            AppError::from(RepositoryError::AlreadyExists).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            AppError::from(RepositoryError::NotFound).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            AppError::from(RepositoryError::Database(sqlx::Error::PoolTimedOut)).kind(),
            ErrorKind::Internal
        );
        assert_eq!(
            AppError::from(RepositoryError::InvalidTtl(i64::MAX)),
            AppError::internal()
        );
    }

    #[test]
    fn test_token_errors_hide_detail() {
        let expired = AppError::from(TokenError::Expired);
        let wrong_type = AppError::from(TokenError::WrongType);
        assert_eq!(expired, wrong_type);
        assert_eq!(expired.kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_response_envelope() {
        let response = AppError::conflict("Email already registered").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({ "message": "Email already registered" }));
    }
}
