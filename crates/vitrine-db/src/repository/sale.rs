//! # Sale Repository
//!
//! Read-side queries over `vendas_lojas`.
//!
//! Sales are written exclusively by [`crate::fulfillment::FulfillmentService`];
//! the schema's triggers reject any UPDATE or DELETE.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use vitrine_core::{Sale, SaleHistoryEntry, HISTORY_LIMIT};

/// Repository for sale lookups and history.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by its ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT
                id,
                loja_id     AS store_id,
                produto_id  AS product_id,
                quantidade  AS quantity,
                valor_total AS total_cents,
                data_venda  AS sold_at
            FROM vendas_lojas
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Sale history, newest first.
    ///
    /// ## Filtering
    /// ```text
    /// store_id = Some(3) → every sale of store 3
    /// store_id = None    → the HISTORY_LIMIT most recent sales, all stores
    /// ```
    pub async fn history(&self, store_id: Option<i64>) -> DbResult<Vec<SaleHistoryEntry>> {
        debug!(?store_id, "Loading sale history");

        let entries = match store_id {
            Some(store_id) => {
                sqlx::query_as::<_, SaleHistoryEntry>(
                    r#"
                    SELECT
                        vl.id          AS id,
                        vl.loja_id     AS store_id,
                        vl.produto_id  AS product_id,
                        vl.quantidade  AS quantity,
                        vl.valor_total AS total_cents,
                        vl.data_venda  AS sold_at,
                        p.nome         AS product_name,
                        l.nome         AS store_name
                    FROM vendas_lojas vl
                    LEFT JOIN produtos p ON p.id = vl.produto_id
                    LEFT JOIN lojas l    ON l.id = vl.loja_id
                    WHERE vl.loja_id = ?1
                    ORDER BY vl.data_venda DESC, vl.id DESC
                    "#,
                )
                .bind(store_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, SaleHistoryEntry>(
                    r#"
                    SELECT
                        vl.id          AS id,
                        vl.loja_id     AS store_id,
                        vl.produto_id  AS product_id,
                        vl.quantidade  AS quantity,
                        vl.valor_total AS total_cents,
                        vl.data_venda  AS sold_at,
                        p.nome         AS product_name,
                        l.nome         AS store_name
                    FROM vendas_lojas vl
                    LEFT JOIN produtos p ON p.id = vl.produto_id
                    LEFT JOIN lojas l    ON l.id = vl.loja_id
                    ORDER BY vl.data_venda DESC, vl.id DESC
                    LIMIT ?1
                    "#,
                )
                .bind(HISTORY_LIMIT)
                .fetch_all(&self.pool)
                .await?
            }
        };

        debug!(count = entries.len(), "Sale history loaded");
        Ok(entries)
    }

    /// Sum of `valor_total` over every sale of a store, in centavos.
    pub async fn total_for_store(&self, store_id: i64) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(valor_total), 0) FROM vendas_lojas WHERE loja_id = ?1",
        )
        .bind(store_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// Counts sales (for diagnostics and tests).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vendas_lojas")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{memory_db, seed_pair};
    use crate::Database;

    async fn insert_sale(db: &Database, store_id: i64, product_id: i64, total: i64, at: &str) -> i64 {
        sqlx::query(
            "INSERT INTO vendas_lojas (loja_id, produto_id, quantidade, valor_total, data_venda) \
             VALUES (?1, ?2, 1, ?3, ?4)",
        )
        .bind(store_id)
        .bind(product_id)
        .bind(total)
        .bind(at)
        .execute(db.pool())
        .await
        .unwrap()
        .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_history_newest_first_with_names() {
        let db = memory_db().await;
        let (store_id, product_id) = seed_pair(&db, 1000, 5).await;
        let older = insert_sale(&db, store_id, product_id, 1000, "2024-01-01T10:00:00+00:00").await;
        let newer = insert_sale(&db, store_id, product_id, 2000, "2024-01-02T10:00:00+00:00").await;

        let history = db.sales().history(Some(store_id)).await.unwrap();
        assert_eq!(history.iter().map(|e| e.id).collect::<Vec<_>>(), vec![newer, older]);
        assert_eq!(history[0].product_name.as_deref(), Some("Caneca"));
        assert_eq!(history[0].store_name.as_deref(), Some("Loja Teste"));
        assert_eq!(history[0].formatted_sold_at(), "02/01/2024 10:00");

        assert!(db.sales().history(Some(store_id + 1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unfiltered_history_is_limited() {
        let db = memory_db().await;
        let (store_id, product_id) = seed_pair(&db, 1000, 5).await;
        for i in 0..(HISTORY_LIMIT + 5) {
            let at = format!("2024-01-01T00:{:02}:{:02}+00:00", i / 60, i % 60);
            insert_sale(&db, store_id, product_id, 100, &at).await;
        }

        let history = db.sales().history(None).await.unwrap();
        assert_eq!(history.len() as i64, HISTORY_LIMIT);
        assert_eq!(db.sales().count().await.unwrap(), HISTORY_LIMIT + 5);
    }

    #[tokio::test]
    async fn test_total_for_store() {
        let db = memory_db().await;
        let (store_id, product_id) = seed_pair(&db, 1000, 5).await;
        assert_eq!(db.sales().total_for_store(store_id).await.unwrap(), 0);

        insert_sale(&db, store_id, product_id, 1000, "2024-01-01T10:00:00+00:00").await;
        insert_sale(&db, store_id, product_id, 2500, "2024-01-01T11:00:00+00:00").await;
        assert_eq!(db.sales().total_for_store(store_id).await.unwrap(), 3500);
    }

    #[tokio::test]
    async fn test_sales_are_append_only() {
        let db = memory_db().await;
        let (store_id, product_id) = seed_pair(&db, 1000, 5).await;
        let id = insert_sale(&db, store_id, product_id, 1000, "2024-01-01T10:00:00+00:00").await;

        let update = sqlx::query("UPDATE vendas_lojas SET valor_total = 0 WHERE id = ?1")
            .bind(id)
            .execute(db.pool())
            .await;
        assert!(update.is_err());

        let delete = sqlx::query("DELETE FROM vendas_lojas WHERE id = ?1")
            .bind(id)
            .execute(db.pool())
            .await;
        assert!(delete.is_err());

        let sale = db.sales().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(sale.total_cents, 1000);
    }
}
