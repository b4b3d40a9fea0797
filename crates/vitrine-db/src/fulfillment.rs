//! # Order Fulfillment
//!
//! Sells N units of a product from a store as one all-or-nothing unit of
//! work: stock decrement, sale record and payment transaction commit
//! together or not at all.
//!
//! ## Transaction Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  fulfill_sale(store, product, qty, kind, details)                       │
//! │       │                                                                 │
//! │       ├── qty <= 0 / unknown kind ─────────────► InvalidArgument       │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │  UPDATE produtos_lojas                          ◄── takes the write    │
//! │     SET quantidade_estoque = quantidade_estoque - qty    lock; other   │
//! │   WHERE loja_id = ? AND produto_id = ?                    sellers wait │
//! │     AND quantidade_estoque >= qty                         here         │
//! │       │                                                                 │
//! │       ├── 0 rows ──► diagnose ──► InsufficientStock | NotFound         │
//! │       ▼                                                                 │
//! │  SELECT remaining stock, unit price (store override or catalog)        │
//! │  total = unit × qty  (checked; must equal the client total if given)   │
//! │  INSERT vendas_lojas ──► sale_id                                       │
//! │  capturer.capture(sale_id, kind, total, details)                       │
//! │  INSERT transacoes (tipo, detalhes, venda_id = sale_id)                │
//! │  ── deadline ends here ──                                               │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error, or the deadline passing, drops the transaction: ROLLBACK.  │
//! │  A COMMIT that has started is never cancelled.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! The sufficiency check and the decrement are the same statement, so two
//! sellers of the last unit can never both pass it. SQLite allows a single
//! writer: the second seller blocks on the write lock (up to the pool's
//! busy timeout), then re-evaluates the condition against the committed
//! stock and observes `InsufficientStock`. A writer that gives up waiting
//! gets `TransactionConflict` and may retry.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::DbError;
use vitrine_core::validation::validate_quantity;
use vitrine_core::{
    CaptureError, CaptureRequest, CoreError, Money, PaymentCapturer, PaymentKind, SaleRequest,
    SaleResult, ValidationError,
};

/// Deadline applied when none is configured.
pub const DEFAULT_FULFILLMENT_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Error
// =============================================================================

/// Classified failure of a sale. Nothing was written when any of these is
/// returned.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// Store, product, or their association does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Non-positive quantity, unknown payment kind, total mismatch...
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Requested more than the store holds.
    #[error(
        "Insufficient stock for product {product_id} at store {store_id}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        store_id: i64,
        product_id: i64,
        available: i64,
        requested: i64,
    },

    /// Another writer held the database past the busy timeout. Retriable.
    #[error("Transaction conflict: {0}")]
    TransactionConflict(String),

    /// The sale did not finish within its deadline. Retriable.
    #[error("Sale timed out after {0:?}")]
    TimedOut(Duration),

    /// The database could not be reached. Retriable.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The payment capturer refused the charge.
    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    /// The payment capturer could not be reached. Retriable.
    #[error("Payment provider unavailable: {0}")]
    PaymentUnavailable(String),

    /// Any other storage failure.
    #[error("Storage error: {0}")]
    Storage(DbError),
}

impl FulfillmentError {
    fn not_found(entity: &str, id: i64) -> Self {
        FulfillmentError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Whether the caller may retry the same request unchanged.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            FulfillmentError::TransactionConflict(_)
                | FulfillmentError::TimedOut(_)
                | FulfillmentError::StoreUnavailable(_)
                | FulfillmentError::PaymentUnavailable(_)
        )
    }
}

impl From<DbError> for FulfillmentError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Busy(msg) => FulfillmentError::TransactionConflict(msg),
            DbError::NotFound { entity, id } => FulfillmentError::NotFound { entity, id },
            e if e.is_unavailable() => FulfillmentError::StoreUnavailable(e.to_string()),
            e => FulfillmentError::Storage(e),
        }
    }
}

impl From<sqlx::Error> for FulfillmentError {
    fn from(err: sqlx::Error) -> Self {
        DbError::from(err).into()
    }
}

impl From<ValidationError> for FulfillmentError {
    fn from(err: ValidationError) -> Self {
        FulfillmentError::InvalidArgument(err.to_string())
    }
}

impl From<CoreError> for FulfillmentError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => FulfillmentError::not_found("Product", id),
            CoreError::StoreNotFound(id) => FulfillmentError::not_found("Store", id),
            CoreError::InsufficientStock {
                store_id,
                product_id,
                available,
                requested,
            } => FulfillmentError::InsufficientStock {
                store_id,
                product_id,
                available,
                requested,
            },
            other @ (CoreError::TotalMismatch { .. }
            | CoreError::AmountOverflow(_)
            | CoreError::Validation(_)) => FulfillmentError::InvalidArgument(other.to_string()),
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// The order fulfillment core.
///
/// ## Example
/// ```rust,ignore
/// let service = db.fulfillment(Arc::new(SimulatedCapturer::new()));
/// let result = service.fulfill_sale(&SaleRequest::new(1, 1, 2)).await?;
/// println!("sale {} left {} in stock", result.sale_id, result.remaining_stock);
/// ```
#[derive(Clone)]
pub struct FulfillmentService {
    pool: SqlitePool,
    capturer: Arc<dyn PaymentCapturer>,
    timeout: Duration,
}

impl std::fmt::Debug for FulfillmentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FulfillmentService")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl FulfillmentService {
    pub fn new(pool: SqlitePool, capturer: Arc<dyn PaymentCapturer>) -> Self {
        FulfillmentService {
            pool,
            capturer,
            timeout: DEFAULT_FULFILLMENT_TIMEOUT,
        }
    }

    /// Sets the deadline for one sale, capture included. The deadline covers
    /// everything up to COMMIT; the commit itself always runs to completion.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Executes one sale.
    ///
    /// ## Returns
    /// * `Ok(SaleResult)` - Committed: stock decremented, sale and payment recorded
    /// * `Err(FulfillmentError)` - Nothing was written
    pub async fn fulfill_sale(&self, request: &SaleRequest) -> Result<SaleResult, FulfillmentError> {
        validate_quantity(request.quantity)?;
        let kind: PaymentKind = request.payment_kind.parse()?;

        debug!(
            store_id = request.store_id,
            product_id = request.product_id,
            quantity = request.quantity,
            kind = %kind,
            "Fulfilling sale"
        );

        let outcome = match tokio::time::timeout(self.timeout, self.prepare(request, kind)).await {
            Ok(Ok((tx, result))) => tx.commit().await.map(|()| result).map_err(Into::into),
            Ok(Err(err)) => Err(err),
            // The dropped future owned the transaction; dropping it rolls back.
            Err(_) => Err(FulfillmentError::TimedOut(self.timeout)),
        };

        match &outcome {
            Ok(result) => info!(
                sale_id = result.sale_id,
                store_id = result.store_id,
                product_id = result.product_id,
                quantity = result.quantity,
                total_cents = result.total_cents,
                remaining_stock = result.remaining_stock,
                "Sale committed"
            ),
            Err(err) => warn!(
                store_id = request.store_id,
                product_id = request.product_id,
                quantity = request.quantity,
                error = %err,
                "Sale rejected"
            ),
        }

        outcome
    }

    /// Runs every statement of the sale and hands back the open transaction.
    async fn prepare(
        &self,
        request: &SaleRequest,
        kind: PaymentKind,
    ) -> Result<(Transaction<'static, Sqlite>, SaleResult), FulfillmentError> {
        let mut tx = self.pool.begin().await?;

        // Check and decrement in one statement.
        let decremented = sqlx::query(
            r#"
            UPDATE produtos_lojas
               SET quantidade_estoque = quantidade_estoque - ?3
             WHERE loja_id = ?1
               AND produto_id = ?2
               AND quantidade_estoque >= ?3
            "#,
        )
        .bind(request.store_id)
        .bind(request.product_id)
        .bind(request.quantity)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if decremented == 0 {
            return Err(diagnose(&mut *tx, request).await);
        }

        let (remaining_stock, unit_price_cents): (i64, i64) = sqlx::query_as(
            r#"
            SELECT pl.quantidade_estoque, COALESCE(pl.preco_loja, p.preco)
              FROM produtos_lojas pl
              JOIN produtos p ON p.id = pl.produto_id
             WHERE pl.loja_id = ?1 AND pl.produto_id = ?2
            "#,
        )
        .bind(request.store_id)
        .bind(request.product_id)
        .fetch_one(&mut *tx)
        .await?;

        let total = Money::from_cents(unit_price_cents)
            .checked_multiply_quantity(request.quantity)
            .ok_or_else(|| {
                CoreError::AmountOverflow(format!(
                    "{} x {}",
                    Money::from_cents(unit_price_cents),
                    request.quantity
                ))
            })?;

        if let Some(expected) = request.expected_total {
            if expected != total {
                return Err(CoreError::TotalMismatch {
                    expected_cents: expected.cents(),
                    computed_cents: total.cents(),
                }
                .into());
            }
        }

        let sold_at = Utc::now();
        let sale_id = sqlx::query(
            r#"
            INSERT INTO vendas_lojas (loja_id, produto_id, quantidade, valor_total, data_venda)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(request.store_id)
        .bind(request.product_id)
        .bind(request.quantity)
        .bind(total.cents())
        .bind(sold_at)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let receipt = self
            .capturer
            .capture(&CaptureRequest {
                sale_id,
                kind,
                amount: total,
                details: request.payment_details.clone(),
            })
            .await
            .map_err(|e| match e {
                CaptureError::Declined(reason) => FulfillmentError::PaymentFailed(reason),
                CaptureError::Timeout => FulfillmentError::TimedOut(self.timeout),
                CaptureError::Unavailable(reason) => FulfillmentError::PaymentUnavailable(reason),
            })?;

        let details = serde_json::to_string(&receipt.details).map_err(DbError::from)?;
        let payment_transaction_id = sqlx::query(
            r#"
            INSERT INTO transacoes (tipo, detalhes, venda_id, data_criacao)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(kind)
        .bind(details)
        .bind(sale_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let result = SaleResult {
            sale_id,
            store_id: request.store_id,
            product_id: request.product_id,
            quantity: request.quantity,
            total_cents: total.cents(),
            remaining_stock,
            payment_transaction_id,
            payment_kind: kind,
            sold_at,
        };
        Ok((tx, result))
    }
}

/// Explains why the conditional decrement matched no row.
async fn diagnose(conn: &mut SqliteConnection, request: &SaleRequest) -> FulfillmentError {
    match classify_miss(conn, request).await {
        Ok(err) | Err(err) => err,
    }
}

async fn classify_miss(
    conn: &mut SqliteConnection,
    request: &SaleRequest,
) -> Result<FulfillmentError, FulfillmentError> {
    let available: Option<i64> = sqlx::query_scalar(
        "SELECT quantidade_estoque FROM produtos_lojas WHERE loja_id = ?1 AND produto_id = ?2",
    )
    .bind(request.store_id)
    .bind(request.product_id)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(available) = available {
        return Ok(FulfillmentError::InsufficientStock {
            store_id: request.store_id,
            product_id: request.product_id,
            available,
            requested: request.quantity,
        });
    }

    let store: Option<i64> = sqlx::query_scalar("SELECT id FROM lojas WHERE id = ?1")
        .bind(request.store_id)
        .fetch_optional(&mut *conn)
        .await?;
    if store.is_none() {
        return Ok(CoreError::StoreNotFound(request.store_id).into());
    }

    let product: Option<i64> = sqlx::query_scalar("SELECT id FROM produtos WHERE id = ?1")
        .bind(request.product_id)
        .fetch_optional(&mut *conn)
        .await?;
    if product.is_none() {
        return Ok(CoreError::ProductNotFound(request.product_id).into());
    }

    Ok(FulfillmentError::NotFound {
        entity: "Inventory".to_string(),
        id: format!("store {} / product {}", request.store_id, request.product_id),
    })
}
