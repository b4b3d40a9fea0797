//! # Payment Handlers
//!
//! Accepted payment method labels and the recorded payment transactions.
//! Transactions are only ever created by a sale.

use axum::extract::State;
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use vitrine_core::validation::validate_name;

use crate::error::ApiError;
use crate::state::AppState;

/// Form body of `POST /formas_pagamento`.
#[derive(Debug, Default, Deserialize)]
pub struct MethodForm {
    pub forma_pagamento: Option<String>,
}

/// `GET /formas_pagamento`
pub async fn list_methods(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let formas = state.db.payments().list_methods().await?;
    Ok(Json(json!({ "formas_pagamento": formas })))
}

/// `POST /formas_pagamento`
pub async fn add_method(
    State(state): State<AppState>,
    Form(form): Form<MethodForm>,
) -> Result<Json<Value>, ApiError> {
    let method = validate_name(
        "forma_pagamento",
        form.forma_pagamento.as_deref().unwrap_or_default(),
    )?;

    let option = state.db.payments().add_method(&method).await?;
    info!(id = option.id, method = %option.method, "Payment method registered");

    Ok(Json(json!({
        "message": "Forma de pagamento adicionada com sucesso",
        "forma_pagamento": option,
    })))
}

/// `GET /transacoes` - newest first.
pub async fn list_transactions(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let historico = state.db.payments().list_transactions().await?;
    Ok(Json(json!({ "historico": historico })))
}
