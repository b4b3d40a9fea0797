//! # Vitrine API
//!
//! HTTP service over the Vitrine catalog, stores and order fulfillment.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Vitrine API                                     │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  itens         │  │  lojas         │  │  vendas                    ││
//! │  │                │  │                │  │                            ││
//! │  │ • list/create  │  │ • list/create  │  │ • POST /vendas ──► core    ││
//! │  │ • get/put/del  │  │ • inventory    │  │ • GET /vendas/{id}         ││
//! │  │ • /produtos    │  │ • dashboard    │  │                            ││
//! │  └────────────────┘  │ • historico    │  └────────────────────────────┘│
//! │                      └────────────────┘                                 │
//! │  ┌────────────────┐  ┌────────────────┐                                │
//! │  │  pagamentos    │  │  status        │                                │
//! │  │ • methods      │  │ • SELECT 1     │                                │
//! │  │ • transacoes   │  │ • migrations   │                                │
//! │  └────────────────┘  └────────────────┘                                │
//! │                                                                         │
//! │  AppState { Database, FulfillmentService, Arc<ApiConfig> }             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`]; every field can be overridden with a
//! `VITRINE_*` environment variable.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

// Re-exports
pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ErrorCode};
pub use handlers::router;
pub use state::AppState;
