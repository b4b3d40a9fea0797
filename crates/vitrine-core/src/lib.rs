//! # vitrine-core: Pure Business Logic for Vitrine
//!
//! Domain types, money arithmetic and validation rules shared by the
//! storage layer and the HTTP service. Nothing in here touches a database,
//! a socket or the file system.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Vitrine Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 vitrine-api (axum HTTP service)                 │   │
//! │  │   /itens  /lojas  /produtos_lojas  /vendas  /historico  ...    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ vitrine-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  payment  │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ Capturer  │  │   rules   │  │   │
//! │  │   │   Sale    │  │  parsing  │  │ Simulated │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 vitrine-db (Database Layer)                     │   │
//! │  │        SQLite queries, migrations, fulfillment transaction      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Store, StoreInventory, Sale, PaymentTransaction)
//! - [`money`] - Money type with integer arithmetic (centavos, no floating point)
//! - [`payment`] - The `PaymentCapturer` capability and its simulated implementation
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use vitrine_core::money::Money;
//!
//! let unit_price = Money::parse_decimal("10.00").unwrap();
//! let total = unit_price.checked_multiply_quantity(2).unwrap();
//! assert_eq!(total.cents(), 2000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod payment;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use payment::{CaptureError, CaptureReceipt, CaptureRequest, PaymentCapturer, SimulatedCapturer};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Category assigned to catalog items created without one.
///
/// Seeded by the reference-data migration.
pub const DEFAULT_CATEGORY_ID: i64 = 1;

/// Maximum number of sales returned by an unfiltered history query.
pub const HISTORY_LIMIT: i64 = 100;
