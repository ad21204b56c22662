//! Error types for the lending server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Numeric error codes returned in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchData = 4,
    BadValue = 5,
    Duplicate = 6,
    ExternalFailure = 7,
    InvalidDate = 10,
    StockNotFound = 11,
    AlreadyBorrowed = 12,
    InsufficientStock = 13,
    AlreadyReturned = 14,
    NoOpenLoan = 15,
    StockCapacityExceeded = 16,
}

/// Closed set of outcomes a borrow or return can be rejected with.
///
/// Every variant except `InvalidDate` and `StockNotFound` is raised inside
/// the loan transaction and causes it to roll back.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanError {
    /// Date field is not `YYYY-MM-DD`
    #[error("invalid format date")]
    InvalidDate,

    /// No stock record exists for the title
    #[error("book stock not found")]
    StockNotFound,

    /// The user already holds an open loan for the title
    #[error("book already borrowed")]
    AlreadyBorrowed,

    /// The conditional decrement matched no row
    #[error("insufficient stock")]
    InsufficientStock,

    /// The user's loan for the title has already been closed
    #[error("book already returned")]
    AlreadyReturned,

    /// The user never borrowed the title
    #[error("no open loan for this book")]
    NoOpenLoan,

    /// Returning would push available stock above total stock
    #[error("available stock would exceed total stock")]
    StockCapacityExceeded,
}

impl LoanError {
    pub fn code(&self) -> ErrorCode {
        match self {
            LoanError::InvalidDate => ErrorCode::InvalidDate,
            LoanError::StockNotFound => ErrorCode::StockNotFound,
            LoanError::AlreadyBorrowed => ErrorCode::AlreadyBorrowed,
            LoanError::InsufficientStock => ErrorCode::InsufficientStock,
            LoanError::AlreadyReturned => ErrorCode::AlreadyReturned,
            LoanError::NoOpenLoan => ErrorCode::NoOpenLoan,
            LoanError::StockCapacityExceeded => ErrorCode::StockCapacityExceeded,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            LoanError::InvalidDate => StatusCode::BAD_REQUEST,
            LoanError::StockNotFound => StatusCode::NOT_FOUND,
            LoanError::AlreadyBorrowed
            | LoanError::InsufficientStock
            | LoanError::AlreadyReturned
            | LoanError::StockCapacityExceeded => StatusCode::CONFLICT,
            LoanError::NoOpenLoan => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
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

    #[error("External service error: {0}")]
    External(String),

    #[error(transparent)]
    Loan(#[from] LoanError),
}

impl AppError {
    /// Loan rejection kind, if this error is one
    pub fn loan_kind(&self) -> Option<LoanError> {
        match self {
            AppError::Loan(kind) => Some(*kind),
            _ => None,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchData, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorCode::Duplicate, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
            AppError::External(msg) => {
                tracing::error!("External service error: {}", msg);
                (StatusCode::BAD_GATEWAY, ErrorCode::ExternalFailure, msg.clone())
            }
            AppError::Loan(kind) => (kind.status(), kind.code(), kind.to_string()),
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
