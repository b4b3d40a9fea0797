//! # Store Repository
//!
//! Database operations for stores (`lojas`) and per-store inventory
//! (`produtos_lojas`).
//!
//! Stock is only decremented by the fulfillment core. This repository sets
//! stock levels absolutely, through the association upsert.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use vitrine_core::{InventoryUpsert, NewStore, Store, StoreInventory};

/// Repository for store and inventory operations.
#[derive(Debug, Clone)]
pub struct StoreRepository {
    pool: SqlitePool,
}

impl StoreRepository {
    /// Creates a new StoreRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StoreRepository { pool }
    }

    /// Lists every store, ordered by id.
    pub async fn list(&self) -> DbResult<Vec<Store>> {
        let stores = sqlx::query_as::<_, Store>(
            r#"
            SELECT
                id,
                nome      AS name,
                descricao AS description,
                endereco  AS address,
                contato   AS contact
            FROM lojas
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(stores)
    }

    /// Gets a store by its ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Store>> {
        let store = sqlx::query_as::<_, Store>(
            r#"
            SELECT
                id,
                nome      AS name,
                descricao AS description,
                endereco  AS address,
                contato   AS contact
            FROM lojas
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(store)
    }

    /// Registers a new store.
    pub async fn insert(&self, store: &NewStore) -> DbResult<Store> {
        debug!(name = %store.name, "Inserting store");

        let id = sqlx::query(
            r#"
            INSERT INTO lojas (nome, descricao, endereco, contato)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&store.name)
        .bind(&store.description)
        .bind(&store.address)
        .bind(&store.contact)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Store", id))
    }

    /// Associates a product with a store, or updates the existing association.
    ///
    /// ## Upsert
    /// ```text
    /// (loja_id, produto_id) absent  → INSERT
    /// (loja_id, produto_id) present → stock and store price replaced
    /// ```
    ///
    /// ## Returns
    /// * `Ok(StoreInventory)` - The association as stored
    /// * `Err(DbError::NotFound)` - Store or product doesn't exist
    pub async fn upsert_inventory(&self, entry: &InventoryUpsert) -> DbResult<StoreInventory> {
        debug!(
            store_id = entry.store_id,
            product_id = entry.product_id,
            stock = entry.stock_quantity,
            "Upserting store inventory"
        );

        let mut tx = self.pool.begin().await?;

        let store_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM lojas WHERE id = ?1")
            .bind(entry.store_id)
            .fetch_optional(&mut *tx)
            .await?;
        if store_exists.is_none() {
            return Err(DbError::not_found("Store", entry.store_id));
        }

        let product_exists: Option<i64> =
            sqlx::query_scalar("SELECT id FROM produtos WHERE id = ?1")
                .bind(entry.product_id)
                .fetch_optional(&mut *tx)
                .await?;
        if product_exists.is_none() {
            return Err(DbError::not_found("Product", entry.product_id));
        }

        sqlx::query(
            r#"
            INSERT INTO produtos_lojas (loja_id, produto_id, quantidade_estoque, preco_loja)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (loja_id, produto_id) DO UPDATE SET
                quantidade_estoque = excluded.quantidade_estoque,
                preco_loja = excluded.preco_loja
            "#,
        )
        .bind(entry.store_id)
        .bind(entry.product_id)
        .bind(entry.stock_quantity)
        .bind(entry.store_price_cents)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_inventory(entry.store_id, entry.product_id)
            .await?
            .ok_or_else(|| DbError::not_found("Inventory", entry.product_id))
    }

    /// Gets the inventory row for one (store, product) pair.
    pub async fn get_inventory(
        &self,
        store_id: i64,
        product_id: i64,
    ) -> DbResult<Option<StoreInventory>> {
        let row = sqlx::query_as::<_, StoreInventory>(
            r#"
            SELECT
                pl.id                 AS id,
                pl.loja_id            AS store_id,
                pl.produto_id         AS product_id,
                pl.quantidade_estoque AS stock_quantity,
                pl.preco_loja         AS store_price_cents,
                l.nome                AS store_name,
                p.nome                AS product_name,
                p.descricao           AS product_description,
                c.nome                AS category_name
            FROM produtos_lojas pl
            JOIN lojas l    ON l.id = pl.loja_id
            JOIN produtos p ON p.id = pl.produto_id
            LEFT JOIN categorias c ON c.id = p.categoria_id
            WHERE pl.loja_id = ?1 AND pl.produto_id = ?2
            "#,
        )
        .bind(store_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Lists every association across all stores, ordered by id.
    pub async fn list_inventory(&self) -> DbResult<Vec<StoreInventory>> {
        let rows = sqlx::query_as::<_, StoreInventory>(
            r#"
            SELECT
                pl.id                 AS id,
                pl.loja_id            AS store_id,
                pl.produto_id         AS product_id,
                pl.quantidade_estoque AS stock_quantity,
                pl.preco_loja         AS store_price_cents,
                l.nome                AS store_name,
                p.nome                AS product_name,
                p.descricao           AS product_description,
                c.nome                AS category_name
            FROM produtos_lojas pl
            JOIN lojas l    ON l.id = pl.loja_id
            JOIN produtos p ON p.id = pl.produto_id
            LEFT JOIN categorias c ON c.id = p.categoria_id
            ORDER BY pl.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Lists the stock of one store, ordered by product name.
    pub async fn store_inventory(&self, store_id: i64) -> DbResult<Vec<StoreInventory>> {
        let rows = sqlx::query_as::<_, StoreInventory>(
            r#"
            SELECT
                pl.id                 AS id,
                pl.loja_id            AS store_id,
                pl.produto_id         AS product_id,
                pl.quantidade_estoque AS stock_quantity,
                pl.preco_loja         AS store_price_cents,
                l.nome                AS store_name,
                p.nome                AS product_name,
                p.descricao           AS product_description,
                c.nome                AS category_name
            FROM produtos_lojas pl
            JOIN lojas l    ON l.id = pl.loja_id
            JOIN produtos p ON p.id = pl.produto_id
            LEFT JOIN categorias c ON c.id = p.categoria_id
            WHERE pl.loja_id = ?1
            ORDER BY p.nome, pl.id
            "#,
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{memory_db, seed_pair};

    fn loja(name: &str) -> NewStore {
        NewStore {
            name: name.to_string(),
            description: None,
            address: Some("Rua A, 10".to_string()),
            contact: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let db = memory_db().await;
        let repo = db.stores();

        let centro = repo.insert(&loja("Centro")).await.unwrap();
        let norte = repo.insert(&loja("Norte")).await.unwrap();
        assert_eq!(centro.address.as_deref(), Some("Rua A, 10"));

        let all = repo.list().await.unwrap();
        assert_eq!(all, vec![centro, norte]);
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_updates() {
        let db = memory_db().await;
        let (store_id, product_id) = seed_pair(&db, 1000, 5).await;
        let repo = db.stores();

        let row = repo
            .upsert_inventory(&InventoryUpsert {
                store_id,
                product_id,
                stock_quantity: 12,
                store_price_cents: Some(900),
            })
            .await
            .unwrap();
        assert_eq!(row.stock_quantity, 12);
        assert_eq!(row.store_price_cents, Some(900));
        assert_eq!(row.product_name.as_deref(), Some("Caneca"));

        // still one association for the pair
        assert_eq!(repo.list_inventory().await.unwrap().len(), 1);
        assert_eq!(repo.store_inventory(store_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_missing_parents() {
        let db = memory_db().await;
        let (store_id, product_id) = seed_pair(&db, 1000, 5).await;
        let repo = db.stores();

        let err = repo
            .upsert_inventory(&InventoryUpsert {
                store_id: 999,
                product_id,
                stock_quantity: 1,
                store_price_cents: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Store"));

        let err = repo
            .upsert_inventory(&InventoryUpsert {
                store_id,
                product_id: 999,
                stock_quantity: 1,
                store_price_cents: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Product"));
    }

    #[tokio::test]
    async fn test_negative_stock_rejected_by_schema() {
        let db = memory_db().await;
        let (store_id, product_id) = seed_pair(&db, 1000, 5).await;

        let err = db
            .stores()
            .upsert_inventory(&InventoryUpsert {
                store_id,
                product_id,
                stock_quantity: -1,
                store_price_cents: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }
}
