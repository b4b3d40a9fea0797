//! # Payment Capture
//!
//! The capability the fulfillment core calls to capture a payment, and the
//! simulated provider used when no real gateway is configured.
//!
//! ## Where Capture Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  fulfill_sale (one transaction)                                         │
//! │                                                                         │
//! │   decrement stock ──► insert sale ──► capturer.capture() ──► insert    │
//! │                                           │                transacao   │
//! │                                           │                             │
//! │                          Ok(receipt) ─────┘  details stored verbatim    │
//! │                          Err(Declined)  ──►  rollback, PaymentFailed    │
//! │                          Err(Timeout)   ──►  rollback, TimedOut         │
//! │                          Err(Unavailable) ► rollback, PaymentUnavailable│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The core trusts whatever the capturer returns. It never retries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::money::Money;
use crate::types::PaymentKind;

// =============================================================================
// Request / Receipt
// =============================================================================

/// What the core asks the capturer to charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureRequest {
    /// Sale being paid (already inserted, not yet committed).
    pub sale_id: i64,
    pub kind: PaymentKind,
    pub amount: Money,
    /// Caller-supplied payload (card token, payer document...).
    pub details: Value,
}

/// Provider response, persisted as `transacoes.detalhes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureReceipt {
    pub details: Value,
}

/// Why a capture did not go through.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The provider refused the charge.
    #[error("Payment declined: {0}")]
    Declined(String),

    /// The provider did not answer in time.
    #[error("Payment provider timed out")]
    Timeout,

    /// The provider could not be reached.
    #[error("Payment provider unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// Capability
// =============================================================================

/// Captures a payment for a sale.
///
/// Implementations must be cheap to share: the service holds one behind an
/// `Arc` and calls it from every request.
#[async_trait]
pub trait PaymentCapturer: Send + Sync {
    async fn capture(&self, request: &CaptureRequest) -> Result<CaptureReceipt, CaptureError>;
}

// =============================================================================
// Simulated Capturer
// =============================================================================

/// Always succeeds, answering with the payloads the fake card and
/// PagSeguro integrations produced.
#[derive(Debug, Clone, Default)]
pub struct SimulatedCapturer;

impl SimulatedCapturer {
    pub fn new() -> Self {
        SimulatedCapturer
    }

    fn reference() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

#[async_trait]
impl PaymentCapturer for SimulatedCapturer {
    async fn capture(&self, request: &CaptureRequest) -> Result<CaptureReceipt, CaptureError> {
        let mut details = match request.kind {
            PaymentKind::Card => json!({
                "id": format!("ch_{}", Self::reference()),
                "amount": request.amount.cents(),
                "currency": "brl",
                "description": format!("Pagamento com cartão de crédito - venda {}", request.sale_id),
                "status": "succeeded",
            }),
            PaymentKind::Boleto => json!({
                "payment_url": format!(
                    "https://pagseguro.uol.com.br/checkout/payment/boleto/{}",
                    Self::reference()
                ),
            }),
            PaymentKind::Pix => json!({
                "payment_url": format!(
                    "https://pagseguro.uol.com.br/checkout/payment/pix/{}",
                    Self::reference()
                ),
            }),
        };

        let has_request = request.details.as_object().is_some_and(|o| !o.is_empty());
        if has_request {
            if let Some(obj) = details.as_object_mut() {
                obj.insert("request".to_string(), request.details.clone());
            }
        }

        Ok(CaptureReceipt { details })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
