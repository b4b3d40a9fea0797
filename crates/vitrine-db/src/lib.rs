//! # vitrine-db: Database Layer for Vitrine
//!
//! SQLite persistence through sqlx, and the order-fulfillment transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vitrine Data Flow                                │
//! │                                                                         │
//! │  HTTP handler (POST /vendas, GET /produtos, ...)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    vitrine-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  product.rs   │    │  (embedded)  │  │   │
//! │  │   │               │◄───│  store.rs     │    │ 001_schema   │  │   │
//! │  │   │ SqlitePool    │    │  sale.rs      │    │ 002_ref_data │  │   │
//! │  │   │               │    │  payment.rs   │    │              │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │                                                     │   │
//! │  │   ┌───────▼──────────────────────────────┐                      │   │
//! │  │   │  FulfillmentService (fulfillment.rs) │ ◄── PaymentCapturer  │   │
//! │  │   │  stock ─► sale ─► capture ─► payment │                      │   │
//! │  │   └──────────────────────────────────────┘                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (./data/vitrine.db, WAL)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (product, store, sale, payment)
//! - [`fulfillment`] - The atomic sale operation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vitrine_core::{SaleRequest, SimulatedCapturer};
//! use vitrine_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./data/vitrine.db")).await?;
//! let produtos = db.products().list_by_name().await?;
//!
//! let fulfillment = db.fulfillment(Arc::new(SimulatedCapturer::new()));
//! let sale = fulfillment.fulfill_sale(&SaleRequest::new(1, 1, 2)).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod fulfillment;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use fulfillment::{FulfillmentError, FulfillmentService, DEFAULT_FULFILLMENT_TIMEOUT};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::payment::PaymentRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use repository::store::StoreRepository;
