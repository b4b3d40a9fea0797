//! # Sale Handlers
//!
//! `POST /vendas` is the only door into the fulfillment core.
//!
//! ## Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /vendas  loja_id=1&produto_id=1&quantidade=2&valor_total=20.00   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SaleForm ──► SaleRequest   (bad field ──► 400)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  FulfillmentService::fulfill_sale                                      │
//! │       │                                                                 │
//! │       ├── Ok ──► 200 { venda_id, estoque_restante, transacao_id, ... } │
//! │       └── Err ─► 404 / 400 / 422 / 409 / 402 / 503                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::{Path, State};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use vitrine_core::validation::{parse_id, parse_payment_details, parse_quantity};
use vitrine_core::{Money, PaymentKind, SaleRequest, ValidationError};

use super::path_id;
use crate::error::ApiError;
use crate::state::AppState;

/// Form body of `POST /vendas`.
#[derive(Debug, Default, Deserialize)]
pub struct SaleForm {
    pub loja_id: Option<String>,
    pub produto_id: Option<String>,
    pub quantidade: Option<String>,
    pub valor_total: Option<String>,
    pub forma_pagamento: Option<String>,
    pub detalhes: Option<String>,
}

impl TryFrom<SaleForm> for SaleRequest {
    type Error = ValidationError;

    /// Only parses. Quantity and payment kind are checked by the core.
    fn try_from(form: SaleForm) -> Result<Self, Self::Error> {
        let store_id = parse_id("loja_id", form.loja_id.as_deref())?;
        let product_id = parse_id("produto_id", form.produto_id.as_deref())?;
        let quantity = parse_quantity(form.quantidade.as_deref())?;

        let kind = match form.forma_pagamento.as_deref().map(str::trim) {
            None | Some("") => PaymentKind::default().as_str().to_string(),
            Some(raw) => raw.to_string(),
        };
        let details = parse_payment_details(form.detalhes.as_deref())?;

        let mut request = SaleRequest::new(store_id, product_id, quantity).with_payment(kind, details);

        if let Some(raw) = form.valor_total.as_deref().map(str::trim) {
            if !raw.is_empty() {
                request = request.with_expected_total(Money::parse_decimal(raw)?);
            }
        }

        Ok(request)
    }
}

/// `POST /vendas`
pub async fn create_sale(
    State(state): State<AppState>,
    Form(form): Form<SaleForm>,
) -> Result<Json<Value>, ApiError> {
    let request = SaleRequest::try_from(form)?;
    let result = state.fulfillment.fulfill_sale(&request).await?;

    Ok(Json(json!({
        "message": "Venda registrada com sucesso",
        "venda_id": result.sale_id,
        "estoque_restante": result.remaining_stock,
        "transacao_id": result.payment_transaction_id,
        "valor_total_cents": result.total_cents,
        "forma_pagamento": result.payment_kind,
    })))
}

/// `GET /vendas/{id}` - a sale and the payment that settled it.
pub async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = path_id("id", &id)?;

    let venda = state
        .db
        .sales()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", id))?;
    let transacao = state.db.payments().for_sale(id).await?;

    Ok(Json(json!({
        "venda": venda,
        "transacao": transacao,
    })))
}
