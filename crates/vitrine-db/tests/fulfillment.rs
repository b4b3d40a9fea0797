//! End-to-end checks of the sale transaction against real SQLite databases.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use vitrine_core::{
    CaptureError, CaptureReceipt, CaptureRequest, Money, PaymentCapturer, PaymentKind,
    SaleRequest, SimulatedCapturer,
};
use vitrine_db::{Database, DbConfig, FulfillmentError, FulfillmentService};

// =============================================================================
// Fixtures
// =============================================================================

struct DecliningCapturer;

#[async_trait]
impl PaymentCapturer for DecliningCapturer {
    async fn capture(&self, _request: &CaptureRequest) -> Result<CaptureReceipt, CaptureError> {
        Err(CaptureError::Declined("cartão recusado".to_string()))
    }
}

struct OfflineCapturer;

#[async_trait]
impl PaymentCapturer for OfflineCapturer {
    async fn capture(&self, _request: &CaptureRequest) -> Result<CaptureReceipt, CaptureError> {
        Err(CaptureError::Unavailable("gateway offline".to_string()))
    }
}

struct SlowCapturer(Duration);

#[async_trait]
impl PaymentCapturer for SlowCapturer {
    async fn capture(&self, _request: &CaptureRequest) -> Result<CaptureReceipt, CaptureError> {
        tokio::time::sleep(self.0).await;
        Ok(CaptureReceipt { details: json!({}) })
    }
}

async fn memory_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// Inserts a store and a product priced `price_cents`, linked with `stock` units.
async fn stocked(db: &Database, price_cents: i64, stock: i64) -> (i64, i64) {
    let pool = db.pool();
    let store_id = sqlx::query("INSERT INTO lojas (nome) VALUES ('Loja Centro')")
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid();
    let product_id =
        sqlx::query("INSERT INTO produtos (nome, preco, categoria_id) VALUES ('Camiseta', ?1, 1)")
            .bind(price_cents)
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid();
    sqlx::query(
        "INSERT INTO produtos_lojas (loja_id, produto_id, quantidade_estoque) VALUES (?1, ?2, ?3)",
    )
    .bind(store_id)
    .bind(product_id)
    .bind(stock)
    .execute(pool)
    .await
    .unwrap();
    (store_id, product_id)
}

async fn stock_of(db: &Database, store_id: i64, product_id: i64) -> i64 {
    db.stores()
        .get_inventory(store_id, product_id)
        .await
        .unwrap()
        .unwrap()
        .stock_quantity
}

fn simulated(db: &Database) -> FulfillmentService {
    db.fulfillment(Arc::new(SimulatedCapturer::new()))
}

async fn assert_nothing_written(db: &Database) {
    assert_eq!(db.sales().count().await.unwrap(), 0);
    assert_eq!(db.payments().count_transactions().await.unwrap(), 0);
}

// =============================================================================
// Successful Sales
// =============================================================================

#[tokio::test]
async fn test_card_sale_records_sale_and_payment() {
    let db = memory_db().await;
    let (store, product) = stocked(&db, 1000, 5).await;

    let result = simulated(&db)
        .fulfill_sale(&SaleRequest::new(store, product, 2))
        .await
        .unwrap();

    assert_eq!(result.total_cents, 2000);
    assert_eq!(result.remaining_stock, 3);
    assert_eq!(result.payment_kind, PaymentKind::Card);
    assert_eq!(stock_of(&db, store, product).await, 3);

    let sale = db.sales().get_by_id(result.sale_id).await.unwrap().unwrap();
    assert_eq!(sale.total(), Money::from_cents(2000));
    assert_eq!(sale.quantity, 2);
    assert_eq!(db.sales().count().await.unwrap(), 1);

    let payment = db
        .payments()
        .get_transaction(result.payment_transaction_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.kind, PaymentKind::Card);
    assert_eq!(payment.sale_id, Some(result.sale_id));
    assert_eq!(payment.details["status"], "succeeded");
    assert_eq!(db.payments().count_transactions().await.unwrap(), 1);
}

#[tokio::test]
async fn test_selling_entire_stock_leaves_zero() {
    let db = memory_db().await;
    let (store, product) = stocked(&db, 500, 3).await;

    let result = simulated(&db)
        .fulfill_sale(&SaleRequest::new(store, product, 3))
        .await
        .unwrap();

    assert_eq!(result.remaining_stock, 0);
    assert_eq!(stock_of(&db, store, product).await, 0);
}

#[tokio::test]
async fn test_store_price_overrides_catalog_price() {
    let db = memory_db().await;
    let (store, product) = stocked(&db, 1000, 10).await;
    sqlx::query("UPDATE produtos_lojas SET preco_loja = 850 WHERE loja_id = ?1 AND produto_id = ?2")
        .bind(store)
        .bind(product)
        .execute(db.pool())
        .await
        .unwrap();

    let result = simulated(&db)
        .fulfill_sale(&SaleRequest::new(store, product, 2))
        .await
        .unwrap();

    assert_eq!(result.total_cents, 1700);
}

#[tokio::test]
async fn test_pix_sale_stores_payment_url_and_echoes_details() {
    let db = memory_db().await;
    let (store, product) = stocked(&db, 1000, 5).await;

    let request = SaleRequest::new(store, product, 1)
        .with_payment("instant_transfer", json!({"cpf": "123.456.789-00"}));
    let result = simulated(&db).fulfill_sale(&request).await.unwrap();
    assert_eq!(result.payment_kind, PaymentKind::Pix);

    let payment = db.payments().for_sale(result.sale_id).await.unwrap().unwrap();
    assert_eq!(payment.kind, PaymentKind::Pix);
    assert!(payment.details["payment_url"]
        .as_str()
        .unwrap()
        .contains("/pix/"));
    assert_eq!(payment.details["request"]["cpf"], "123.456.789-00");
}

#[tokio::test]
async fn test_matching_expected_total_is_accepted() {
    let db = memory_db().await;
    let (store, product) = stocked(&db, 1000, 5).await;

    let request = SaleRequest::new(store, product, 2)
        .with_expected_total(Money::parse_decimal("20.00").unwrap());
    let result = simulated(&db).fulfill_sale(&request).await.unwrap();
    assert_eq!(result.total_cents, 2000);
}

// =============================================================================
// Rejected Sales
// =============================================================================

#[tokio::test]
async fn test_out_of_stock_is_rejected_without_writes() {
    let db = memory_db().await;
    let (store, product) = stocked(&db, 1000, 0).await;

    let err = simulated(&db)
        .fulfill_sale(&SaleRequest::new(store, product, 1))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FulfillmentError::InsufficientStock {
            available: 0,
            requested: 1,
            ..
        }
    ));
    assert!(!err.is_retriable());
    assert_eq!(stock_of(&db, store, product).await, 0);
    assert_nothing_written(&db).await;
}

#[tokio::test]
async fn test_quantity_above_stock_is_rejected() {
    let db = memory_db().await;
    let (store, product) = stocked(&db, 1000, 5).await;

    let err = simulated(&db)
        .fulfill_sale(&SaleRequest::new(store, product, 6))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FulfillmentError::InsufficientStock {
            available: 5,
            requested: 6,
            ..
        }
    ));
    assert_eq!(stock_of(&db, store, product).await, 5);
    assert_nothing_written(&db).await;
}

#[tokio::test]
async fn test_unknown_store_product_and_pair() {
    let db = memory_db().await;
    let (store, product) = stocked(&db, 1000, 5).await;
    let service = simulated(&db);

    let err = service
        .fulfill_sale(&SaleRequest::new(999, product, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, FulfillmentError::NotFound { ref entity, .. } if entity == "Store"));

    let err = service
        .fulfill_sale(&SaleRequest::new(store, 999, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, FulfillmentError::NotFound { ref entity, .. } if entity == "Product"));

    // Both exist but the store does not carry the product.
    let other_store = sqlx::query("INSERT INTO lojas (nome) VALUES ('Loja Norte')")
        .execute(db.pool())
        .await
        .unwrap()
        .last_insert_rowid();
    let err = service
        .fulfill_sale(&SaleRequest::new(other_store, product, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, FulfillmentError::NotFound { ref entity, .. } if entity == "Inventory"));

    assert_nothing_written(&db).await;
}

#[tokio::test]
async fn test_invalid_quantity_and_kind() {
    let db = memory_db().await;
    let (store, product) = stocked(&db, 1000, 5).await;
    let service = simulated(&db);

    for qty in [0, -3] {
        let err = service
            .fulfill_sale(&SaleRequest::new(store, product, qty))
            .await
            .unwrap_err();
        assert!(matches!(err, FulfillmentError::InvalidArgument(_)));
    }

    let err = service
        .fulfill_sale(&SaleRequest::new(store, product, 1).with_payment("bitcoin", json!({})))
        .await
        .unwrap_err();
    assert!(matches!(err, FulfillmentError::InvalidArgument(_)));

    assert_eq!(stock_of(&db, store, product).await, 5);
    assert_nothing_written(&db).await;
}

#[tokio::test]
async fn test_wrong_expected_total_rolls_back() {
    let db = memory_db().await;
    let (store, product) = stocked(&db, 1000, 5).await;

    let request =
        SaleRequest::new(store, product, 2).with_expected_total(Money::from_cents(1));
    let err = simulated(&db).fulfill_sale(&request).await.unwrap_err();

    assert!(matches!(err, FulfillmentError::InvalidArgument(_)));
    assert_eq!(stock_of(&db, store, product).await, 5);
    assert_nothing_written(&db).await;
}

// =============================================================================
// Atomicity
// =============================================================================

#[tokio::test]
async fn test_failed_payment_insert_restores_stock() {
    let db = memory_db().await;
    let (store, product) = stocked(&db, 1000, 5).await;
    sqlx::query(
        "CREATE TRIGGER fail_transacoes BEFORE INSERT ON transacoes
         BEGIN SELECT RAISE(ABORT, 'forced failure'); END;",
    )
    .execute(db.pool())
    .await
    .unwrap();

    let err = simulated(&db)
        .fulfill_sale(&SaleRequest::new(store, product, 2))
        .await
        .unwrap_err();

    assert!(matches!(err, FulfillmentError::Storage(_)));
    assert_eq!(stock_of(&db, store, product).await, 5);
    assert_nothing_written(&db).await;
}

#[tokio::test]
async fn test_declined_payment_rolls_back() {
    let db = memory_db().await;
    let (store, product) = stocked(&db, 1000, 5).await;

    let err = db
        .fulfillment(Arc::new(DecliningCapturer))
        .fulfill_sale(&SaleRequest::new(store, product, 1))
        .await
        .unwrap_err();

    assert!(matches!(err, FulfillmentError::PaymentFailed(ref reason) if reason == "cartão recusado"));
    assert!(!err.is_retriable());
    assert_eq!(stock_of(&db, store, product).await, 5);
    assert_nothing_written(&db).await;
}

#[tokio::test]
async fn test_unreachable_provider_is_retriable() {
    let db = memory_db().await;
    let (store, product) = stocked(&db, 1000, 5).await;

    let err = db
        .fulfillment(Arc::new(OfflineCapturer))
        .fulfill_sale(&SaleRequest::new(store, product, 1))
        .await
        .unwrap_err();

    assert!(matches!(err, FulfillmentError::PaymentUnavailable(_)));
    assert!(err.is_retriable());
    assert_nothing_written(&db).await;
}

#[tokio::test]
async fn test_deadline_aborts_transaction() {
    let db = memory_db().await;
    let (store, product) = stocked(&db, 1000, 5).await;

    let service = db
        .fulfillment(Arc::new(SlowCapturer(Duration::from_millis(500))))
        .with_timeout(Duration::from_millis(50));
    let err = service
        .fulfill_sale(&SaleRequest::new(store, product, 2))
        .await
        .unwrap_err();

    assert!(matches!(err, FulfillmentError::TimedOut(d) if d == Duration::from_millis(50)));
    assert!(err.is_retriable());
    assert_eq!(stock_of(&db, store, product).await, 5);
    assert_nothing_written(&db).await;

    // The connection is usable again after the abandoned transaction.
    let result = simulated(&db)
        .fulfill_sale(&SaleRequest::new(store, product, 2))
        .await
        .unwrap();
    assert_eq!(result.remaining_stock, 3);
}

// =============================================================================
// Concurrency
// =============================================================================

async fn file_db(dir: &tempfile::TempDir, busy_timeout: Duration) -> Database {
    let config = DbConfig::new(dir.path().join("vitrine.db"))
        .max_connections(4)
        .busy_timeout(busy_timeout);
    Database::new(config).await.unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_timed_out_sale_never_commits() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_db(&dir, Duration::from_secs(5)).await;
    let (store, product) = stocked(&db, 100, 1_000).await;

    let mut sold: i64 = 0;
    let mut timed_out: i64 = 0;
    for micros in (50..3_000).step_by(10) {
        let before = db.sales().count().await.unwrap();
        let service = simulated(&db).with_timeout(Duration::from_micros(micros));

        match service.fulfill_sale(&SaleRequest::new(store, product, 1)).await {
            Ok(_) => sold += 1,
            Err(FulfillmentError::TimedOut(_)) => {
                timed_out += 1;
                tokio::time::sleep(Duration::from_millis(5)).await;
                assert_eq!(
                    db.sales().count().await.unwrap(),
                    before,
                    "sale committed after timing out at {micros}us"
                );
            }
            Err(other) => panic!("unexpected error at {micros}us: {other}"),
        }
    }

    assert_eq!(sold + timed_out, 295);
    assert_eq!(db.sales().count().await.unwrap(), sold);
    assert_eq!(db.payments().count_transactions().await.unwrap(), sold);
    assert_eq!(stock_of(&db, store, product).await, 1_000 - sold);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_held_write_lock_is_a_retriable_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_db(&dir, Duration::from_millis(50)).await;
    let (store, product) = stocked(&db, 1000, 5).await;

    let mut other_writer = db.pool().begin().await.unwrap();
    sqlx::query("UPDATE lojas SET nome = nome WHERE id = ?1")
        .bind(store)
        .execute(&mut *other_writer)
        .await
        .unwrap();

    let err = simulated(&db)
        .fulfill_sale(&SaleRequest::new(store, product, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, FulfillmentError::TransactionConflict(_)), "{err:?}");
    assert!(err.is_retriable());

    other_writer.rollback().await.unwrap();
    assert_eq!(stock_of(&db, store, product).await, 5);
    assert_nothing_written(&db).await;

    // Once the lock is released the same sale goes through.
    let result = simulated(&db)
        .fulfill_sale(&SaleRequest::new(store, product, 2))
        .await
        .unwrap();
    assert_eq!(result.remaining_stock, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_unit_is_sold_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = DbConfig::new(dir.path().join("vitrine.db"))
        .max_connections(4)
        .busy_timeout(Duration::from_secs(5));
    let db = Database::new(config).await.unwrap();
    let (store, product) = stocked(&db, 1000, 1).await;

    let service = simulated(&db);
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .fulfill_sale(&SaleRequest::new(store, product, 1))
                    .await
            })
        })
        .collect();

    let mut sold = 0;
    let mut out_of_stock = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(result) => {
                assert_eq!(result.remaining_stock, 0);
                sold += 1;
            }
            Err(FulfillmentError::InsufficientStock { available: 0, .. }) => out_of_stock += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(sold, 1);
    assert_eq!(out_of_stock, 1);
    assert_eq!(stock_of(&db, store, product).await, 0);
    assert_eq!(db.sales().count().await.unwrap(), 1);
    assert_eq!(db.payments().count_transactions().await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sales_never_oversell() {
    let dir = tempfile::tempdir().unwrap();
    let config = DbConfig::new(dir.path().join("vitrine.db"))
        .max_connections(4)
        .busy_timeout(Duration::from_secs(10));
    let db = Database::new(config).await.unwrap();
    let (store, product) = stocked(&db, 250, 10).await;

    let service = simulated(&db);
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .fulfill_sale(&SaleRequest::new(store, product, 1))
                    .await
            })
        })
        .collect();

    let mut sold = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            sold += 1;
        }
    }

    assert_eq!(sold, 10);
    assert_eq!(stock_of(&db, store, product).await, 0);
    assert_eq!(db.sales().count().await.unwrap(), 10);
    assert_eq!(db.sales().total_for_store(store).await.unwrap(), 2500);
}
