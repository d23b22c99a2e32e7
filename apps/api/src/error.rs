//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Kiosco POS                             │
//! │                                                                         │
//! │  Handler                                                               │
//! │  Result<Json<T>, ApiError>                                             │
//! │         │                                                               │
//! │         ├── JSON body rejected ────────────► 400 INVALID_BODY          │
//! │         ├── ValidationError / EmptyLineSet ─► 400                      │
//! │         ├── ProductNotFound / SaleNotFound ─► 404                      │
//! │         ├── InsufficientStock, invoice rules ► 409                     │
//! │         └── DbError (storage) ──────────────► 500 DATABASE_ERROR       │
//! │                                              (logged, generic text,    │
//! │                                               "retryable": true)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Response Body
//! ```json
//! {
//!   "code": "INSUFFICIENT_STOCK",
//!   "message": "Insufficient stock for Alfajor: available 3, requested 5",
//!   "details": { "product_id": "…", "available": 3, "requested": 5 }
//! }
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use kiosco_core::{CoreError, ValidationError};
use kiosco_db::{DbError, ServiceError};

/// API error returned from handlers.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status code
    pub status: StatusCode,

    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Structured context (which product, how many units)
    pub details: Option<Value>,

    /// Set on storage failures: nothing was committed, the call can be repeated
    pub retryable: bool,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request body is not valid JSON or has the wrong shape (400)
    InvalidBody,

    /// Input validation failed (400)
    ValidationError,

    /// Sale without lines (400)
    EmptyLineSet,

    /// Zero or negative quantity (400)
    InvalidQuantity,

    /// Unknown product (404)
    ProductNotFound,

    /// Unknown sale (404)
    SaleNotFound,

    /// Other missing record (404)
    NotFound,

    /// Not enough units on hand (409)
    InsufficientStock,

    /// Invoice state cannot move that way (409)
    InvalidInvoiceTransition,

    /// Invoiced sales cannot be deleted (409)
    SaleAlreadyInvoiced,

    /// Unique / foreign key / check constraint (409)
    Conflict,

    /// Storage failed (500)
    DatabaseError,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: ErrorCode,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    retryable: bool,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    /// Attaches structured context to the error.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Creates a 400 validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, ErrorCode::ValidationError, message)
    }

    /// Creates a 500 storage error with a generic message.
    pub fn storage(message: impl Into<String>, retryable: bool) -> Self {
        ApiError {
            retryable,
            ..ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::DatabaseError,
                message,
            )
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code,
            message: &self.message,
            details: self.details.as_ref(),
            retryable: self.retryable,
        };
        (self.status, Json(body)).into_response()
    }
}

// =============================================================================
// Conversions
// =============================================================================

/// Converts core errors to API errors.
///
/// Missing entities are 404, state conflicts 409, everything else is a bad
/// request.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let status = if err.is_not_found() {
            StatusCode::NOT_FOUND
        } else if err.is_conflict() {
            StatusCode::CONFLICT
        } else {
            StatusCode::BAD_REQUEST
        };
        let message = err.to_string();

        match err {
            CoreError::ProductNotFound(id) => {
                ApiError::new(status, ErrorCode::ProductNotFound, message)
                    .with_details(json!({ "product_id": id }))
            }
            CoreError::SaleNotFound(id) => ApiError::new(status, ErrorCode::SaleNotFound, message)
                .with_details(json!({ "sale_id": id })),
            CoreError::InsufficientStock {
                product_id,
                name,
                available,
                requested,
            } => ApiError::new(status, ErrorCode::InsufficientStock, message).with_details(json!({
                "product_id": product_id,
                "name": name,
                "available": available,
                "requested": requested,
            })),
            CoreError::EmptyLineSet => ApiError::new(status, ErrorCode::EmptyLineSet, message),
            CoreError::TooManyLines { .. } => {
                ApiError::new(status, ErrorCode::ValidationError, message)
            }
            CoreError::InvalidQuantity {
                product_id,
                quantity,
            } => ApiError::new(status, ErrorCode::InvalidQuantity, message)
                .with_details(json!({ "product_id": product_id, "quantity": quantity })),
            CoreError::InvalidInvoiceTransition { .. } => {
                ApiError::new(status, ErrorCode::InvalidInvoiceTransition, message)
            }
            CoreError::SaleAlreadyInvoiced(_) => {
                ApiError::new(status, ErrorCode::SaleAlreadyInvoiced, message)
            }
            CoreError::Validation(e) => ApiError::from(e),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts database errors to API errors.
///
/// Storage details are logged, never sent to the client.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { ref entity, ref id } => ApiError::new(
                StatusCode::NOT_FOUND,
                ErrorCode::NotFound,
                format!("{entity} not found: {id}"),
            ),
            DbError::UniqueViolation { .. }
            | DbError::ForeignKeyViolation { .. }
            | DbError::CheckViolation { .. } => {
                tracing::warn!(error = %err, "Constraint violation");
                ApiError::new(StatusCode::CONFLICT, ErrorCode::Conflict, err.to_string())
            }
            other => {
                tracing::error!(error = %other, "Database operation failed");
                ApiError::storage("Database operation failed", other.is_transient())
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => e.into(),
            ServiceError::Storage(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            ErrorCode::InvalidBody,
            rejection.body_text(),
        )
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
