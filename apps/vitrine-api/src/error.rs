//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Vitrine                                │
//! │                                                                         │
//! │  Client                      Rust Backend                               │
//! │  ──────                      ────────────                               │
//! │                                                                         │
//! │  POST /vendas                                                           │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Handler                                                         │  │
//! │  │  Result<Json<T>, ApiError>                                       │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Form field bad? ──── ValidationError ──────────┐               │  │
//! │  │         │                                       │               │  │
//! │  │         ▼                                       ▼               │  │
//! │  │  Sale rejected? ───── FulfillmentError ──── ApiError ──► status │  │
//! │  │         │                                       ▲    + JSON     │  │
//! │  │         ▼                                       │               │  │
//! │  │  CRUD failed? ─────── DbError ──────────────────┘               │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  HTTP/1.1 422                                                           │
//! │  { "code": "INSUFFICIENT_STOCK",                                        │
//! │    "message": "Insufficient stock for product 1 at store 1: ...",       │
//! │    "retriable": false }                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage failures are logged in full and answered with a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use vitrine_core::{CoreError, ValidationError};
use vitrine_db::{DbError, FulfillmentError};

/// API error returned from handlers.
///
/// ## Serialization
/// This is what the client receives when a request fails:
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Store not found: 7",
///   "retriable": false
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Whether repeating the same request may succeed
    pub retriable: bool,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Not enough stock to sell (422)
    InsufficientStock,

    /// Duplicate or still-referenced row (409)
    Conflict,

    /// Concurrent writer held the database (409, retriable)
    TransactionConflict,

    /// Sale exceeded its deadline (503, retriable)
    Timeout,

    /// Database or payment provider unreachable (503, retriable)
    Unavailable,

    /// Payment declined (402)
    PaymentError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::InsufficientStock => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::Conflict | ErrorCode::TransactionConflict => StatusCode::CONFLICT,
            ErrorCode::Timeout | ErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::PaymentError => StatusCode::PAYMENT_REQUIRED,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new, non-retriable API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            retriable: false,
        }
    }

    /// Creates a retriable API error.
    pub fn retriable(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            retriable: true,
            ..ApiError::new(code, message)
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error. The detail is logged, never returned.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "Request failed");
        ApiError::new(ErrorCode::Internal, "Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
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
        (self.status(), Json(self)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::Conflict, "Record is referenced by other rows")
            }
            DbError::CheckViolation { message } => {
                ApiError::validation(format!("Invalid value: {}", message))
            }
            DbError::Busy(_) => ApiError::retriable(
                ErrorCode::TransactionConflict,
                "Database busy, try again",
            ),
            e @ (DbError::ConnectionFailed(_) | DbError::PoolExhausted) => {
                tracing::error!(error = %e, "Database unavailable");
                ApiError::retriable(ErrorCode::Unavailable, "Database unavailable")
            }
            e @ (DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::Corrupt(_)
            | DbError::Internal(_)) => ApiError::internal(e),
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", id),
            CoreError::StoreNotFound(id) => ApiError::not_found("Store", id),
            e @ CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, e.to_string())
            }
            e @ (CoreError::TotalMismatch { .. } | CoreError::AmountOverflow(_)) => {
                ApiError::validation(e.to_string())
            }
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts classified sale failures to API errors.
impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        let retriable = err.is_retriable();
        let code = match &err {
            FulfillmentError::NotFound { .. } => ErrorCode::NotFound,
            FulfillmentError::InvalidArgument(_) => ErrorCode::ValidationError,
            FulfillmentError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            FulfillmentError::TransactionConflict(_) => ErrorCode::TransactionConflict,
            FulfillmentError::TimedOut(_) => ErrorCode::Timeout,
            FulfillmentError::StoreUnavailable(_) | FulfillmentError::PaymentUnavailable(_) => {
                ErrorCode::Unavailable
            }
            FulfillmentError::PaymentFailed(_) => ErrorCode::PaymentError,
            FulfillmentError::Storage(_) => return ApiError::internal(&err),
        };

        ApiError {
            code,
            message: err.to_string(),
            retriable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_fulfillment_status_codes() {
        assert_eq!(
            status_of(FulfillmentError::NotFound {
                entity: "Store".to_string(),
                id: "9".to_string(),
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(FulfillmentError::InvalidArgument("quantidade".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(FulfillmentError::InsufficientStock {
                store_id: 1,
                product_id: 1,
                available: 0,
                requested: 1,
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(FulfillmentError::TransactionConflict("locked".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(FulfillmentError::TimedOut(Duration::from_secs(5))),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(FulfillmentError::StoreUnavailable("closed".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(FulfillmentError::PaymentFailed("recusado".to_string())),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            status_of(FulfillmentError::Storage(DbError::QueryFailed("x".to_string()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_retriable_flag_follows_error_kind() {
        let err: ApiError = FulfillmentError::TimedOut(Duration::from_secs(1)).into();
        assert!(err.retriable);
        assert_eq!(err.code, ErrorCode::Timeout);

        let err: ApiError = FulfillmentError::InsufficientStock {
            store_id: 1,
            product_id: 2,
            available: 0,
            requested: 1,
        }
        .into();
        assert!(!err.retriable);
    }

    #[test]
    fn test_storage_details_are_not_exposed() {
        let err: ApiError = DbError::QueryFailed("no such table: produtos".to_string()).into();
        assert_eq!(err.code, ErrorCode::Internal);
        assert_eq!(err.message, "Internal server error");
    }

    #[test]
    fn test_crud_conflicts() {
        assert_eq!(
            status_of(DbError::duplicate("forma_pagamento", "pix")),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DbError::ForeignKeyViolation {
                message: "FOREIGN KEY constraint failed".to_string(),
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DbError::CheckViolation {
                message: "CHECK constraint failed: preco >= 0".to_string(),
            }),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_value(ApiError::not_found("Product", 3)).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Product not found: 3");
        assert_eq!(json["retriable"], false);
    }
}
