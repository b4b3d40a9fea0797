//! # Catalog Handlers
//!
//! CRUD over `produtos`, plus the name-ordered listing the storefront uses.
//!
//! ## Price Input
//! ```text
//! preco=19,90  ──► Money::parse_decimal ──► 1990 centavos
//! preco=19.9   ──► 1990
//! preco=-1     ──► 400 VALIDATION_ERROR
//! ```

use axum::extract::{Path, State};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use vitrine_core::validation::{normalize_text, parse_id, validate_name, validate_new_product};
use vitrine_core::{Money, NewProduct, ValidationError, DEFAULT_CATEGORY_ID};

use super::path_id;
use crate::error::ApiError;
use crate::state::AppState;

/// Form body of `POST /itens` and `PUT /itens/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct ItemForm {
    pub nome: Option<String>,
    pub descricao: Option<String>,
    pub preco: Option<String>,
    pub categoria_id: Option<String>,
}

impl ItemForm {
    /// Builds the product, using `fallback_category` when none was sent.
    fn into_product(self, fallback_category: i64) -> Result<NewProduct, ValidationError> {
        let name = validate_name("nome", self.nome.as_deref().unwrap_or_default())?;
        let description = normalize_text("descricao", self.descricao.as_deref())?;

        let price = self
            .preco
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ValidationError::required("preco"))
            .and_then(Money::parse_decimal)?;

        let category_id = match self.categoria_id.as_deref().map(str::trim) {
            None | Some("") => fallback_category,
            Some(raw) => parse_id("categoria_id", Some(raw))?,
        };

        let product = NewProduct {
            name,
            description,
            price_cents: price.cents(),
            category_id,
        };
        validate_new_product(&product)?;
        Ok(product)
    }
}

/// `GET /itens` - catalog, newest first.
pub async fn list_items(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let itens = state.db.products().list_recent().await?;
    Ok(Json(json!({ "itens": itens })))
}

/// `GET /produtos` - catalog with category names, by name.
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let produtos = state.db.products().list_by_name().await?;
    Ok(Json(json!({ "produtos": produtos })))
}

/// `POST /itens`
pub async fn create_item(
    State(state): State<AppState>,
    Form(form): Form<ItemForm>,
) -> Result<Json<Value>, ApiError> {
    let product = form.into_product(DEFAULT_CATEGORY_ID)?;
    let created = state.db.products().insert(&product).await?;

    info!(product_id = created.id, name = %created.name, "Product created");

    Ok(Json(json!({
        "message": "Item adicionado com sucesso",
        "produto_id": created.id,
    })))
}

/// `GET /itens/{id}`
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = path_id("id", &id)?;
    let item = state
        .db
        .products()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    Ok(Json(json!({ "item": item })))
}

/// `PUT /itens/{id}` - replaces name, description and price. The category
/// is kept unless `categoria_id` is sent.
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<ItemForm>,
) -> Result<Json<Value>, ApiError> {
    let id = path_id("id", &id)?;
    let products = state.db.products();

    let current = products
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    let product = form.into_product(current.category_id.unwrap_or(DEFAULT_CATEGORY_ID))?;
    let item = products.update(id, &product).await?;

    info!(product_id = id, "Product updated");

    Ok(Json(json!({
        "message": "Item atualizado com sucesso",
        "item": item,
    })))
}

/// `DELETE /itens/{id}`
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = path_id("id", &id)?;
    state.db.products().delete(id).await?;

    info!(product_id = id, "Product deleted");

    Ok(Json(json!({ "message": "Item removido com sucesso" })))
}
