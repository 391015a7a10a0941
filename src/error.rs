//! Error types for Carrel server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error codes exposed in API error bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchRecord = 4,
    Duplicate = 5,
    BadValue = 6,
    NotAvailable = 7,
    MaxBorrowsReached = 8,
    AlreadyReturned = 9,
    AlreadyProcessed = 10,
    NotApproved = 11,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl AppError {
    /// Map this error onto the numeric code table. Business-rule messages
    /// carry their own codes so clients can distinguish "out of copies"
    /// from "loan limit reached" without parsing text.
    fn error_code(&self) -> ErrorCode {
        match self {
            AppError::Authentication(_) | AppError::Authorization(_) => ErrorCode::NotAuthorized,
            AppError::NotFound(_) => ErrorCode::NoSuchRecord,
            AppError::Validation(_) => ErrorCode::BadValue,
            AppError::Database(_) => ErrorCode::DbFailure,
            AppError::Conflict(msg) => {
                if msg.contains("already been processed") {
                    ErrorCode::AlreadyProcessed
                } else {
                    ErrorCode::Duplicate
                }
            }
            AppError::BadRequest(_) => ErrorCode::BadValue,
            AppError::Internal(_) => ErrorCode::Failure,
            AppError::BusinessRule(msg) => {
                if msg.contains("Maximum") {
                    ErrorCode::MaxBorrowsReached
                } else if msg.contains("already") {
                    ErrorCode::AlreadyReturned
                } else if msg.contains("approv") {
                    ErrorCode::NotApproved
                } else {
                    ErrorCode::NotAvailable
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.error_code();
        let (status, message) = match &self {
            AppError::Authentication(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Authorization(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::BusinessRule(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn auth_errors_map_to_401_and_403() {
        assert_eq!(status_of(AppError::Authentication("nope".into())), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AppError::Authorization("nope".into())), StatusCode::FORBIDDEN);
    }

    #[test]
    fn conflict_maps_to_409() {
        assert_eq!(status_of(AppError::Conflict("duplicate".into())), StatusCode::CONFLICT);
    }

    #[test]
    fn business_rule_maps_to_422() {
        assert_eq!(
            status_of(AppError::BusinessRule("Not enough copies available".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn business_rule_codes_distinguish_limit_from_availability() {
        assert_eq!(
            AppError::BusinessRule("Maximum active loans reached (5/5)".into()).error_code(),
            ErrorCode::MaxBorrowsReached
        );
        assert_eq!(
            AppError::BusinessRule("This book has already been returned".into()).error_code(),
            ErrorCode::AlreadyReturned
        );
        assert_eq!(
            AppError::BusinessRule("Not enough copies available".into()).error_code(),
            ErrorCode::NotAvailable
        );
    }

    #[test]
    fn already_processed_conflicts_get_their_own_code() {
        assert_eq!(
            AppError::Conflict("This profile has already been processed".into()).error_code(),
            ErrorCode::AlreadyProcessed
        );
        assert_eq!(
            AppError::Conflict("Email already registered".into()).error_code(),
            ErrorCode::Duplicate
        );
    }
}
