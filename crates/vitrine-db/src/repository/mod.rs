//! # Repository Module
//!
//! Database repository implementations for Vitrine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.products().list_by_name()                                  │
//! │       ▼                                                                 │
//! │  ProductRepository ── produtos, categorias                             │
//! │  StoreRepository   ── lojas, produtos_lojas                            │
//! │  SaleRepository    ── vendas_lojas (read side only)                    │
//! │  PaymentRepository ── pagamentos, transacoes (read side + methods)     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Rows in vendas_lojas and transacoes are only ever written by the      │
//! │  fulfillment core (crate::fulfillment), inside one transaction.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog CRUD
//! - [`store::StoreRepository`] - Stores and per-store inventory
//! - [`sale::SaleRepository`] - Sale lookup, history and dashboard totals
//! - [`payment::PaymentRepository`] - Payment methods and transactions

pub mod payment;
pub mod product;
pub mod sale;
pub mod store;
