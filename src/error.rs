use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// ApiError
///
/// The application's error taxonomy. Every fallible handler returns
/// `Result<_, ApiError>`, and the `IntoResponse` implementation below maps each
/// variant to the matching HTTP status with a JSON body. Repository failures
/// enter through the `From<sqlx::Error>` conversion, which inspects the
/// database error so that a unique-constraint violation on `users.email`
/// surfaces as `Conflict` rather than a generic 500.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or rejected input (bad email, empty title, invalid tier, ...).
    #[error("{0}")]
    Validation(String),

    /// No valid session, or credentials that failed verification.
    /// Login failures reuse this variant so the response never distinguishes
    /// an unknown email from a wrong password.
    #[error("You must be logged in to access this resource")]
    Unauthorized,

    /// Authenticated, but the membership tier or admin flag is insufficient.
    #[error("{0}")]
    Forbidden(&'static str),

    /// The referenced entity does not exist.
    #[error("{0}")]
    NotFound(&'static str),

    /// Duplicate email at registration.
    #[error("Email already registered")]
    Conflict,

    /// Underlying database failure.
    #[error("Database error")]
    Database(sqlx::Error),

    /// Anything else unexpected (e.g. password hashing failure).
    #[error("Internal server error")]
    Internal(String),
}

/// Error response body for JSON responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Conflict => (StatusCode::CONFLICT, "EMAIL_TAKEN"),
            Self::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        // Internal details are logged, never sent to the client.
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("internal error: {:?}", self);
        }

        let body = Json(ErrorResponse {
            error: code.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return ApiError::Conflict;
            }
        }
        ApiError::Database(err)
    }
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
