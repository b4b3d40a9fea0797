//! # Application State
//!
//! Shared by every handler through axum's `State` extractor.
//!
//! ## Thread Safety
//! `Database` wraps a `SqlitePool` and `FulfillmentService` holds the same
//! pool plus an `Arc` capturer, so cloning the state per request is cheap
//! and needs no locking.

use std::sync::Arc;

use vitrine_core::PaymentCapturer;
use vitrine_db::{Database, FulfillmentService};

use crate::config::ApiConfig;

#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub fulfillment: FulfillmentService,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    /// Wires the fulfillment core to `db` with the configured deadline.
    pub fn new(db: Database, capturer: Arc<dyn PaymentCapturer>, config: ApiConfig) -> Self {
        let fulfillment = db
            .fulfillment(capturer)
            .with_timeout(config.fulfillment_timeout());

        AppState {
            db,
            fulfillment,
            config: Arc::new(config),
        }
    }
}
