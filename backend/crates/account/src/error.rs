//! Account Error Types
//!
//! Account-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

pub type AccountResult<T> = Result<T, AccountError>;

#[derive(Debug, Error)]
pub enum AccountError {
    /// Unknown identifier or wrong secret. The two causes are never distinguished.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Malformed token or bad signature
    #[error("Invalid token")]
    InvalidToken,

    /// Signature valid, expiry passed
    #[error("Token has expired")]
    ExpiredToken,

    /// Refresh token is not bound in the refresh token store
    #[error("Unknown refresh token")]
    UnknownRefreshToken,

    /// No bearer token on a protected route
    #[error("Missing bearer token")]
    MissingToken,

    /// Caller lacks ownership or role for the operation
    #[error("Not allowed to access this user")]
    AuthorizationDenied,

    #[error("User not found")]
    UserNotFound,

    #[error("Email is already registered")]
    EmailTaken,

    /// Input failed value-object validation
    #[error("{0}")]
    Validation(String),

    /// Image storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AccountError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccountError::InvalidCredentials
            | AccountError::InvalidToken
            | AccountError::ExpiredToken
            | AccountError::UnknownRefreshToken
            | AccountError::MissingToken => ErrorKind::Unauthorized,
            AccountError::AuthorizationDenied => ErrorKind::Forbidden,
            AccountError::UserNotFound => ErrorKind::NotFound,
            AccountError::EmailTaken => ErrorKind::Conflict,
            AccountError::Validation(_) => ErrorKind::BadRequest,
            AccountError::Storage(_) => ErrorKind::ServiceUnavailable,
            AccountError::Database(_) | AccountError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.to_string());
        match self {
            AccountError::ExpiredToken => {
                err.with_action("Exchange your refresh token for a new access token")
            }
            AccountError::UnknownRefreshToken => err.with_action("Sign in again"),
            // Internal details stay in the logs
            AccountError::Database(_) | AccountError::Internal(_) => {
                AppError::internal("Internal server error")
            }
            _ => err,
        }
    }

    fn log(&self) {
        match self {
            AccountError::Database(e) => {
                tracing::error!(error = %e, "Account database error");
            }
            AccountError::Internal(msg) => {
                tracing::error!(message = %msg, "Account internal error");
            }
            AccountError::Storage(msg) => {
                tracing::error!(message = %msg, "Image storage error");
            }
            AccountError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AccountError::InvalidToken => {
                tracing::warn!("Rejected token with bad signature or format");
            }
            AccountError::AuthorizationDenied => {
                tracing::warn!("Authorization denied");
            }
            _ => {
                tracing::debug!(error = %self, "Account error");
            }
        }
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AccountError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::BadRequest => AccountError::Validation(err.message().to_string()),
            _ => AccountError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_transport_mapping() {
        let unauthorized = [
            AccountError::InvalidCredentials,
            AccountError::InvalidToken,
            AccountError::ExpiredToken,
            AccountError::UnknownRefreshToken,
            AccountError::MissingToken,
        ];
        for err in unauthorized {
            assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
        }

        assert_eq!(
            AccountError::AuthorizationDenied.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AccountError::UserNotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AccountError::EmailTaken.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AccountError::Validation("bad".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let app_err = AccountError::Internal("pool exploded at 10.0.0.3".into()).to_app_error();
        assert_eq!(app_err.status_code(), 500);
        assert!(!app_err.message().contains("10.0.0.3"));
    }

    #[test]
    fn test_from_bad_request_app_error() {
        let err: AccountError = AppError::bad_request("Invalid email format").into();
        assert!(matches!(err, AccountError::Validation(ref m) if m == "Invalid email format"));
    }
}
