//! # Error Types
//!
//! Domain-specific error types for vitrine-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  vitrine-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  vitrine-db errors (separate crate)                                    │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── FulfillmentError - Classified outcome of a failed sale            │
//! │                                                                         │
//! │  vitrine-api errors (in app)                                           │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → FulfillmentError → ApiError        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// Store cannot be found.
    #[error("Store not found: {0}")]
    StoreNotFound(i64),

    /// Insufficient stock to complete sale.
    ///
    /// ## When This Occurs
    /// ```text
    /// POST /vendas (quantidade: 5)
    ///      │
    ///      ▼
    /// Conditional decrement matches no row (available=3)
    ///      │
    ///      ▼
    /// InsufficientStock { store_id: 1, product_id: 7, available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// HTTP 422: "Insufficient stock for product 7 at store 1: available 3, requested 5"
    /// ```
    #[error(
        "Insufficient stock for product {product_id} at store {store_id}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        store_id: i64,
        product_id: i64,
        available: i64,
        requested: i64,
    },

    /// Client-supplied total disagrees with the computed one.
    #[error("Total mismatch: expected {expected_cents} centavos, computed {computed_cents}")]
    TotalMismatch {
        expected_cents: i64,
        computed_cents: i64,
    },

    /// Monetary arithmetic would overflow.
    #[error("Amount overflow: {0}")]
    AmountOverflow(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any SQL runs.
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

    /// Invalid format (e.g., not a number, malformed JSON).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Creates a Required error.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Creates an InvalidFormat error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
