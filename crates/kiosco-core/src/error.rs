//! # Error Types
//!
//! Domain-specific error types for kiosco-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kiosco-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  kiosco-db errors (separate crate)                                     │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── ServiceError     - CoreError | DbError from sale/stock protocol   │
//! │                                                                         │
//! │  API errors (apps/api)                                                 │
//! │  └── ApiError         - What HTTP clients see (JSON body + status)     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → ApiError           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::InvoiceState;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every variant carries the context a client needs to explain the failure
/// (which product, how many units) instead of a bare status string.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Insufficient stock to complete a debit.
    ///
    /// ## User Workflow
    /// ```text
    /// POST /sales  (Alfajor × 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Alfajor", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 Alfajor in stock"
    /// ```
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// A sale was submitted without lines.
    #[error("A sale must contain at least one product")]
    EmptyLineSet,

    /// Too many lines in a single sale.
    #[error("A sale cannot have more than {max} lines")]
    TooManyLines { max: usize },

    /// Quantity is zero or negative.
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: String, quantity: i64 },

    /// The invoice state cannot move in the requested direction.
    #[error("Sale {sale_id} cannot go from {from} to {to}")]
    InvalidInvoiceTransition {
        sale_id: String,
        from: InvoiceState,
        to: InvoiceState,
    },

    /// An invoiced sale cannot be reversed.
    #[error("Sale {0} is already invoiced and cannot be deleted")]
    SaleAlreadyInvoiced(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns true when the error means "the referenced entity does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::ProductNotFound(_) | CoreError::SaleNotFound(_))
    }

    /// Returns true when the request was well-formed but conflicts with the
    /// current state of the data.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            CoreError::InsufficientStock { .. }
                | CoreError::InvalidInvoiceTransition { .. }
                | CoreError::SaleAlreadyInvoiced(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any storage interaction.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
