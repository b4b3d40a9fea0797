//! # HTTP Handlers
//!
//! Each module covers one of the back-office areas.
//!
//! ## Route Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  itens        GET/POST /itens          GET/PUT/DELETE /itens/{id}      │
//! │               GET /produtos                                             │
//! │  lojas        GET/POST /lojas          POST /produtos_lojas            │
//! │               GET /dashboard/{loja_id} GET /historico[?loja_id=]       │
//! │  vendas       POST /vendas             GET /vendas/{id}                │
//! │  pagamentos   GET/POST /formas_pagamento  GET /transacoes              │
//! │  status       GET /status                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Request bodies are `application/x-www-form-urlencoded`. Every form field
//! is read as an optional string and parsed by `vitrine_core::validation`,
//! so a malformed field answers with the same JSON error shape as any other
//! rejection.

pub mod itens;
pub mod lojas;
pub mod pagamentos;
pub mod status;
pub mod vendas;

use axum::routing::{get, post};
use axum::Router;
use vitrine_core::validation::parse_id;

use crate::error::ApiError;
use crate::state::AppState;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Catalog
        .route("/itens", get(itens::list_items).post(itens::create_item))
        .route(
            "/itens/{id}",
            get(itens::get_item)
                .put(itens::update_item)
                .delete(itens::delete_item),
        )
        .route("/produtos", get(itens::list_products))
        // Stores
        .route("/lojas", get(lojas::list_stores).post(lojas::create_store))
        .route("/produtos_lojas", post(lojas::upsert_inventory))
        .route("/dashboard/{loja_id}", get(lojas::dashboard))
        .route("/historico", get(lojas::history))
        // Sales
        .route("/vendas", post(vendas::create_sale))
        .route("/vendas/{id}", get(vendas::get_sale))
        // Payments
        .route(
            "/formas_pagamento",
            get(pagamentos::list_methods).post(pagamentos::add_method),
        )
        .route("/transacoes", get(pagamentos::list_transactions))
        // Health
        .route("/status", get(status::status))
        .with_state(state)
}

/// Parses an id taken from the URL path.
pub(crate) fn path_id(field: &str, raw: &str) -> Result<i64, ApiError> {
    Ok(parse_id(field, Some(raw))?)
}
