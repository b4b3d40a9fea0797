//! # Product Repository
//!
//! Database operations for the catalog (`produtos`, `categorias`).
//!
//! ## Key Operations
//! - Listing (newest first for `/itens`, by name for `/produtos`)
//! - CRUD operations
//! - Delete with its store associations, in one transaction
//!
//! ## Delete Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DELETE /itens/7                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │  DELETE FROM produtos_lojas WHERE produto_id = 7                        │
//! │  DELETE FROM produtos WHERE id = 7                                      │
//! │       │                                                                 │
//! │       ├── 0 rows        → rollback, NotFound                            │
//! │       ├── FK violation  → rollback, sales still reference product 7    │
//! │       └── ok            → COMMIT                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use vitrine_core::{NewProduct, Product};

/// Repository for catalog operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists every product, newest first.
    pub async fn list_recent(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                p.id            AS id,
                p.nome          AS name,
                p.descricao     AS description,
                p.preco         AS price_cents,
                p.categoria_id  AS category_id,
                c.nome          AS category_name
            FROM produtos p
            LEFT JOIN categorias c ON c.id = p.categoria_id
            ORDER BY p.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed products by id");
        Ok(products)
    }

    /// Lists every product with its category name, ordered by name.
    ///
    /// Ties on name are broken by id so the listing is stable.
    pub async fn list_by_name(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                p.id            AS id,
                p.nome          AS name,
                p.descricao     AS description,
                p.preco         AS price_cents,
                p.categoria_id  AS category_id,
                c.nome          AS category_name
            FROM produtos p
            LEFT JOIN categorias c ON c.id = p.categoria_id
            ORDER BY p.nome, p.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed products by name");
        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                p.id            AS id,
                p.nome          AS name,
                p.descricao     AS description,
                p.preco         AS price_cents,
                p.categoria_id  AS category_id,
                c.nome          AS category_name
            FROM produtos p
            LEFT JOIN categorias c ON c.id = p.categoria_id
            WHERE p.id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with its new id
    /// * `Err(DbError::NotFound)` - The category doesn't exist
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        debug!(name = %product.name, price_cents = product.price_cents, "Inserting product");

        let result = sqlx::query(
            r#"
            INSERT INTO produtos (nome, descricao, preco, categoria_id)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.category_id)
        .execute(&self.pool)
        .await
        .map_err(|e| category_not_found(e.into(), product.category_id))?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Replaces name, description, price and category of a product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The updated product
    /// * `Err(DbError::NotFound)` - Product (or category) doesn't exist
    pub async fn update(&self, id: i64, product: &NewProduct) -> DbResult<Product> {
        debug!(id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE produtos SET
                nome = ?2,
                descricao = ?3,
                preco = ?4,
                categoria_id = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.category_id)
        .execute(&self.pool)
        .await
        .map_err(|e| category_not_found(e.into(), product.category_id))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product and its store associations.
    ///
    /// Fails with `ForeignKeyViolation` when sales reference the product;
    /// sales are append-only, so such a product can never be removed.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting product");

        let mut tx = self.pool.begin().await?;

        let unlinked = sqlx::query("DELETE FROM produtos_lojas WHERE produto_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let deleted = sqlx::query("DELETE FROM produtos WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            // tx dropped here: rolled back
            return Err(DbError::not_found("Product", id));
        }

        tx.commit().await?;

        debug!(id, unlinked, "Product deleted");
        Ok(())
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM produtos")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// On `produtos` the only foreign key is the category.
fn category_not_found(err: DbError, category_id: i64) -> DbError {
    match err {
        DbError::ForeignKeyViolation { .. } => DbError::not_found("Category", category_id),
        other => other,
    }
}
