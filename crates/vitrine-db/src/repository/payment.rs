//! # Payment Repository
//!
//! Accepted payment methods (`pagamentos`) and recorded payment
//! transactions (`transacoes`).
//!
//! `transacoes.detalhes` holds the provider payload as JSON text; rows are
//! decoded through [`TransactionRow`] and parsed on the way out.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use vitrine_core::{PaymentKind, PaymentOption, PaymentTransaction};

/// `transacoes` as stored.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    kind: PaymentKind,
    details: String,
    sale_id: Option<i64>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for PaymentTransaction {
    type Error = DbError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let details = serde_json::from_str(&row.details).map_err(|e| {
            DbError::Corrupt(format!("transacoes.detalhes of transaction {}: {e}", row.id))
        })?;

        Ok(PaymentTransaction {
            id: row.id,
            kind: row.kind,
            details,
            sale_id: row.sale_id,
            created_at: row.created_at,
        })
    }
}

/// Repository for payment methods and transactions.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Lists accepted payment method labels, ordered by id.
    pub async fn list_methods(&self) -> DbResult<Vec<PaymentOption>> {
        let methods = sqlx::query_as::<_, PaymentOption>(
            "SELECT id, metodo AS method FROM pagamentos ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(methods)
    }

    /// Registers a payment method label.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - The label already exists
    pub async fn add_method(&self, method: &str) -> DbResult<PaymentOption> {
        debug!(method, "Registering payment method");

        let id = sqlx::query("INSERT INTO pagamentos (metodo) VALUES (?1)")
            .bind(method)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("forma_pagamento", method),
                other => other,
            })?
            .last_insert_rowid();

        Ok(PaymentOption {
            id,
            method: method.to_string(),
        })
    }

    /// Lists payment transactions, newest first.
    pub async fn list_transactions(&self) -> DbResult<Vec<PaymentTransaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT
                id,
                tipo         AS kind,
                detalhes     AS details,
                venda_id     AS sale_id,
                data_criacao AS created_at
            FROM transacoes
            ORDER BY data_criacao DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PaymentTransaction::try_from).collect()
    }

    /// Gets a transaction by its ID.
    pub async fn get_transaction(&self, id: i64) -> DbResult<Option<PaymentTransaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT
                id,
                tipo         AS kind,
                detalhes     AS details,
                venda_id     AS sale_id,
                data_criacao AS created_at
            FROM transacoes
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PaymentTransaction::try_from).transpose()
    }

    /// Gets the transaction that settled a sale.
    pub async fn for_sale(&self, sale_id: i64) -> DbResult<Option<PaymentTransaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT
                id,
                tipo         AS kind,
                detalhes     AS details,
                venda_id     AS sale_id,
                data_criacao AS created_at
            FROM transacoes
            WHERE venda_id = ?1
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(sale_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PaymentTransaction::try_from).transpose()
    }

    /// Counts transactions (for diagnostics and tests).
    pub async fn count_transactions(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transacoes")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_db;

    #[tokio::test]
    async fn test_reference_methods_are_seeded() {
        let db = memory_db().await;
        let methods = db.payments().list_methods().await.unwrap();
        let labels: Vec<_> = methods.iter().map(|m| m.method.as_str()).collect();
        assert_eq!(labels, vec!["card", "boleto", "pix"]);
    }

    #[tokio::test]
    async fn test_add_method_rejects_duplicates() {
        let db = memory_db().await;
        let repo = db.payments();

        let added = repo.add_method("vale_presente").await.unwrap();
        assert_eq!(added.method, "vale_presente");

        let err = repo.add_method("vale_presente").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "forma_pagamento"));
    }

    #[tokio::test]
    async fn test_details_round_trip_through_text() {
        let db = memory_db().await;
        let id = sqlx::query(
            "INSERT INTO transacoes (tipo, detalhes, venda_id, data_criacao) \
             VALUES ('pix', ?1, NULL, '2024-01-01T00:00:00+00:00')",
        )
        .bind(r#"{"payment_url":"https://example.test/pix/1"}"#)
        .execute(db.pool())
        .await
        .unwrap()
        .last_insert_rowid();

        let tx = db.payments().get_transaction(id).await.unwrap().unwrap();
        assert_eq!(tx.kind, PaymentKind::Pix);
        assert_eq!(tx.details["payment_url"], "https://example.test/pix/1");
        assert_eq!(db.payments().list_transactions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_details_are_reported() {
        let db = memory_db().await;
        let id = sqlx::query(
            "INSERT INTO transacoes (tipo, detalhes, data_criacao) \
             VALUES ('card', 'not json', '2024-01-01T00:00:00+00:00')",
        )
        .execute(db.pool())
        .await
        .unwrap()
        .last_insert_rowid();

        let err = db.payments().get_transaction(id).await.unwrap_err();
        assert!(matches!(err, DbError::Corrupt(_)));
    }

    #[tokio::test]
    async fn test_unknown_kind_rejected_by_schema() {
        let db = memory_db().await;
        let result = sqlx::query(
            "INSERT INTO transacoes (tipo, detalhes, data_criacao) \
             VALUES ('cheque', '{}', '2024-01-01T00:00:00+00:00')",
        )
        .execute(db.pool())
        .await;
        assert!(matches!(
            result.map_err(DbError::from),
            Err(DbError::CheckViolation { .. })
        ));
    }
}
