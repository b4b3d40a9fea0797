//! # Store Handlers
//!
//! Stores, their inventory, the per-store dashboard and the sales history.

use axum::extract::{Path, Query, State};
use axum::{Form, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use vitrine_core::validation::{
    normalize_text, parse_id, parse_optional_count, validate_inventory_upsert, validate_name,
    validate_new_store,
};
use vitrine_core::{InventoryUpsert, Money, NewStore, SaleHistoryEntry, ValidationError};

use super::path_id;
use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Forms
// =============================================================================

/// Form body of `POST /lojas`.
#[derive(Debug, Default, Deserialize)]
pub struct StoreForm {
    pub nome: Option<String>,
    pub descricao: Option<String>,
    pub endereco: Option<String>,
    pub contato: Option<String>,
}

impl TryFrom<StoreForm> for NewStore {
    type Error = ValidationError;

    fn try_from(form: StoreForm) -> Result<Self, Self::Error> {
        let store = NewStore {
            name: validate_name("nome", form.nome.as_deref().unwrap_or_default())?,
            description: normalize_text("descricao", form.descricao.as_deref())?,
            address: normalize_text("endereco", form.endereco.as_deref())?,
            contact: normalize_text("contato", form.contato.as_deref())?,
        };
        validate_new_store(&store)?;
        Ok(store)
    }
}

/// Form body of `POST /produtos_lojas`.
#[derive(Debug, Default, Deserialize)]
pub struct InventoryForm {
    pub loja_id: Option<String>,
    pub produto_id: Option<String>,
    pub quantidade_estoque: Option<String>,
    pub preco_loja: Option<String>,
}

impl TryFrom<InventoryForm> for InventoryUpsert {
    type Error = ValidationError;

    fn try_from(form: InventoryForm) -> Result<Self, Self::Error> {
        let store_price_cents = match form.preco_loja.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(Money::parse_decimal(raw)?.cents()),
        };

        let entry = InventoryUpsert {
            store_id: parse_id("loja_id", form.loja_id.as_deref())?,
            product_id: parse_id("produto_id", form.produto_id.as_deref())?,
            stock_quantity: parse_optional_count(
                "quantidade_estoque",
                form.quantidade_estoque.as_deref(),
            )?
            .unwrap_or(0),
            store_price_cents,
        };
        validate_inventory_upsert(&entry)?;
        Ok(entry)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub loja_id: Option<String>,
}

/// One line of the sales history screen.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryRow {
    pub id: i64,
    pub loja_id: i64,
    pub produto_id: i64,
    pub quantidade: i64,
    pub valor_total_cents: i64,
    pub data_venda: DateTime<Utc>,
    pub produto_nome: Option<String>,
    pub loja_nome: Option<String>,
    pub data_formatada: String,
}

impl From<SaleHistoryEntry> for HistoryRow {
    fn from(entry: SaleHistoryEntry) -> Self {
        HistoryRow {
            data_formatada: entry.formatted_sold_at(),
            id: entry.id,
            loja_id: entry.store_id,
            produto_id: entry.product_id,
            quantidade: entry.quantity,
            valor_total_cents: entry.total_cents,
            data_venda: entry.sold_at,
            produto_nome: entry.product_name,
            loja_nome: entry.store_name,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /lojas`
pub async fn list_stores(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let lojas = state.db.stores().list().await?;
    Ok(Json(json!({ "lojas": lojas })))
}

/// `POST /lojas` - answers with the created id and the full store list.
pub async fn create_store(
    State(state): State<AppState>,
    Form(form): Form<StoreForm>,
) -> Result<Json<Value>, ApiError> {
    let store = NewStore::try_from(form)?;
    let stores = state.db.stores();

    let created = stores.insert(&store).await?;
    info!(store_id = created.id, name = %created.name, "Store created");

    let lojas = stores.list().await?;
    Ok(Json(json!({
        "message": "Loja cadastrada com sucesso",
        "loja_id": created.id,
        "lojas": lojas,
    })))
}

/// `POST /produtos_lojas` - sets the stock (and optional store price) of a
/// product at a store, creating the association if needed.
pub async fn upsert_inventory(
    State(state): State<AppState>,
    Form(form): Form<InventoryForm>,
) -> Result<Json<Value>, ApiError> {
    let entry = InventoryUpsert::try_from(form)?;
    let stores = state.db.stores();

    let saved = stores.upsert_inventory(&entry).await?;
    info!(
        store_id = saved.store_id,
        product_id = saved.product_id,
        stock = saved.stock_quantity,
        "Inventory updated"
    );

    let produtos_lojas = stores.list_inventory().await?;
    Ok(Json(json!({
        "message": "Produto associado à loja com sucesso",
        "produtos_lojas": produtos_lojas,
    })))
}

/// `GET /dashboard/{loja_id}` - store, its sales, its stock and total sold.
pub async fn dashboard(
    State(state): State<AppState>,
    Path(loja_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let store_id = path_id("loja_id", &loja_id)?;

    let loja = state
        .db
        .stores()
        .get_by_id(store_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Store", store_id))?;

    let vendas: Vec<HistoryRow> = state
        .db
        .sales()
        .history(Some(store_id))
        .await?
        .into_iter()
        .map(HistoryRow::from)
        .collect();
    let estoque = state.db.stores().store_inventory(store_id).await?;
    let total = state.db.sales().total_for_store(store_id).await?;

    Ok(Json(json!({
        "loja": loja,
        "vendas": vendas,
        "estoque": estoque,
        "total_vendido_cents": total,
    })))
}

/// `GET /historico[?loja_id=]` - newest first; unfiltered history is capped.
pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Value>, ApiError> {
    let store_id = match query.loja_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_id("loja_id", Some(raw))?),
    };

    let historico: Vec<HistoryRow> = state
        .db
        .sales()
        .history(store_id)
        .await?
        .into_iter()
        .map(HistoryRow::from)
        .collect();

    Ok(Json(json!({
        "total_vendas": historico.len(),
        "historico": historico,
    })))
}
