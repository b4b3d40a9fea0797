//! # Domain Types
//!
//! Core domain types used throughout Vitrine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Store       │   │ StoreInventory  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  store_id (FK)  │       │
//! │  │  name           │   │  name           │   │  product_id(FK) │       │
//! │  │  price_cents    │   │  address        │   │  stock_quantity │       │
//! │  │  category_id    │   │  contact        │   │  store_price?   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Sale       │   │ PaymentTrans-   │   │  PaymentKind    │       │
//! │  │  (append-only)  │   │ action (append) │   │  ─────────────  │       │
//! │  │  store_id       │   │  kind           │   │  Card           │       │
//! │  │  product_id     │   │  details (JSON) │   │  Boleto         │       │
//! │  │  quantity > 0   │   │  sale_id (FK)   │   │  Pix            │       │
//! │  │  total_cents    │   │  created_at     │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity is keyed by the `INTEGER PRIMARY KEY AUTOINCREMENT` the
//! database hands out. Field names are English; the Portuguese column names
//! are mapped with SQL aliases in `vitrine-db`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

// =============================================================================
// Payment Kind
// =============================================================================

/// The fixed set of payment kinds a transaction can carry.
///
/// Stored canonically as `card`, `boleto` or `pix`. Parsing also accepts
/// the labels older clients send (`cartao`, `invoice`, `instant_transfer`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    /// Credit/debit card charge.
    Card,
    /// Bank invoice (boleto bancário).
    Boleto,
    /// Instant transfer.
    Pix,
}

impl PaymentKind {
    /// All kinds, in display order.
    pub const ALL: [PaymentKind; 3] = [PaymentKind::Card, PaymentKind::Boleto, PaymentKind::Pix];

    /// Canonical storage label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentKind::Card => "card",
            PaymentKind::Boleto => "boleto",
            PaymentKind::Pix => "pix",
        }
    }
}

impl Default for PaymentKind {
    fn default() -> Self {
        PaymentKind::Card
    }
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "card" | "cartao" | "cartao_credito" => Ok(PaymentKind::Card),
            "boleto" | "invoice" => Ok(PaymentKind::Boleto),
            "pix" | "instant_transfer" => Ok(PaymentKind::Pix),
            _ => Err(ValidationError::NotAllowed {
                field: "forma_pagamento".to_string(),
                allowed: PaymentKind::ALL.iter().map(|k| k.as_str().to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,

    /// Display name.
    pub name: String,

    pub description: Option<String>,

    /// Catalog price in centavos. Never negative.
    pub price_cents: i64,

    pub category_id: Option<i64>,

    /// Joined from `categorias` when listing.
    pub category_name: Option<String>,
}

impl Product {
    /// Returns the catalog price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// Input for creating or replacing a catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub category_id: i64,
}

// =============================================================================
// Store
// =============================================================================

/// A sales outlet with its own inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Store {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub contact: Option<String>,
}

/// Input for registering a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewStore {
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub contact: Option<String>,
}

// =============================================================================
// Store Inventory
// =============================================================================

/// Stock of one product at one store, with the optional store price.
///
/// Unique per (store_id, product_id). `stock_quantity` is never negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StoreInventory {
    pub id: i64,
    pub store_id: i64,
    pub product_id: i64,
    pub stock_quantity: i64,

    /// Overrides the catalog price at this store when set.
    pub store_price_cents: Option<i64>,

    pub store_name: Option<String>,
    pub product_name: Option<String>,
    pub product_description: Option<String>,
    pub category_name: Option<String>,
}

impl StoreInventory {
    /// Price charged at this store: the override if present, else the catalog price.
    pub fn unit_price(&self, catalog_price: Money) -> Money {
        self.store_price_cents
            .map(Money::from_cents)
            .unwrap_or(catalog_price)
    }

    /// Checks that `requested` units can be taken from this row.
    pub fn check_available(&self, requested: i64) -> CoreResult<()> {
        if self.stock_quantity >= requested {
            Ok(())
        } else {
            Err(CoreError::InsufficientStock {
                store_id: self.store_id,
                product_id: self.product_id,
                available: self.stock_quantity,
                requested,
            })
        }
    }
}

/// Input for associating a product with a store (insert or update).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryUpsert {
    pub store_id: i64,
    pub product_id: i64,
    pub stock_quantity: i64,
    pub store_price_cents: Option<i64>,
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale. Append-only: never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: i64,
    pub store_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub sold_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the sale total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A sale joined with the names shown in the history screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleHistoryEntry {
    pub id: i64,
    pub store_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub sold_at: DateTime<Utc>,
    pub product_name: Option<String>,
    pub store_name: Option<String>,
}

impl SaleHistoryEntry {
    /// `dd/mm/YYYY HH:MM`, the format the history screen shows.
    pub fn formatted_sold_at(&self) -> String {
        self.sold_at.format("%d/%m/%Y %H:%M").to_string()
    }
}

// =============================================================================
// Payment Transaction
// =============================================================================

/// The recorded outcome of a payment capture. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentTransaction {
    pub id: i64,
    pub kind: PaymentKind,

    /// Opaque provider payload.
    #[ts(type = "Record<string, unknown>")]
    pub details: serde_json::Value,

    /// The sale this payment settled.
    pub sale_id: Option<i64>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// An accepted payment method label (`pagamentos` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PaymentOption {
    pub id: i64,
    pub method: String,
}

// =============================================================================
// Fulfillment Request / Result
// =============================================================================

/// "Sell `quantity` units of `product_id` from `store_id`."
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRequest {
    pub store_id: i64,
    pub product_id: i64,
    pub quantity: i64,

    /// Raw payment kind label; parsed by the fulfillment core.
    pub payment_kind: String,

    /// Caller payload, forwarded to the capturer.
    pub payment_details: serde_json::Value,

    /// Total the client believes it is paying, checked against the computed one.
    pub expected_total: Option<Money>,
}

impl SaleRequest {
    /// A card sale with no details and no expected total.
    pub fn new(store_id: i64, product_id: i64, quantity: i64) -> Self {
        Self {
            store_id,
            product_id,
            quantity,
            payment_kind: PaymentKind::Card.as_str().to_string(),
            payment_details: serde_json::Value::Object(serde_json::Map::new()),
            expected_total: None,
        }
    }

    pub fn with_payment(mut self, kind: impl Into<String>, details: serde_json::Value) -> Self {
        self.payment_kind = kind.into();
        self.payment_details = details;
        self
    }

    pub fn with_expected_total(mut self, total: Money) -> Self {
        self.expected_total = Some(total);
        self
    }
}

/// Outcome of a committed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleResult {
    pub sale_id: i64,
    pub store_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub total_cents: i64,

    /// Stock left at the store after this sale.
    pub remaining_stock: i64,

    pub payment_transaction_id: i64,
    pub payment_kind: PaymentKind,

    #[ts(as = "String")]
    pub sold_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory(stock: i64, store_price: Option<i64>) -> StoreInventory {
        StoreInventory {
            id: 1,
            store_id: 1,
            product_id: 7,
            stock_quantity: stock,
            store_price_cents: store_price,
            store_name: None,
            product_name: None,
            product_description: None,
            category_name: None,
        }
    }

    #[test]
    fn test_payment_kind_parsing() {
        assert_eq!("card".parse::<PaymentKind>().unwrap(), PaymentKind::Card);
        assert_eq!("Cartao".parse::<PaymentKind>().unwrap(), PaymentKind::Card);
        assert_eq!("invoice".parse::<PaymentKind>().unwrap(), PaymentKind::Boleto);
        assert_eq!(" pix ".parse::<PaymentKind>().unwrap(), PaymentKind::Pix);
        assert_eq!("instant_transfer".parse::<PaymentKind>().unwrap(), PaymentKind::Pix);
        assert!(matches!(
            "cash".parse::<PaymentKind>(),
            Err(ValidationError::NotAllowed { .. })
        ));
    }

    #[test]
    fn test_payment_kind_serde_uses_storage_label() {
        assert_eq!(serde_json::to_string(&PaymentKind::Boleto).unwrap(), "\"boleto\"");
        assert_eq!(PaymentKind::Card.to_string(), "card");
        assert_eq!(PaymentKind::default(), PaymentKind::Card);
    }

    #[test]
    fn test_unit_price_prefers_store_override() {
        let catalog = Money::from_cents(1000);
        assert_eq!(inventory(5, None).unit_price(catalog).cents(), 1000);
        assert_eq!(inventory(5, Some(850)).unit_price(catalog).cents(), 850);
    }

    #[test]
    fn test_check_available() {
        assert!(inventory(5, None).check_available(5).is_ok());
        let err = inventory(3, None).check_available(5).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 3, requested: 5, .. }
        ));
    }

    #[test]
    fn test_history_date_format() {
        let entry = SaleHistoryEntry {
            id: 1,
            store_id: 1,
            product_id: 1,
            quantity: 1,
            total_cents: 100,
            sold_at: DateTime::parse_from_rfc3339("2024-03-05T14:07:00Z")
                .unwrap()
                .with_timezone(&Utc),
            product_name: None,
            store_name: None,
        };
        assert_eq!(entry.formatted_sold_at(), "05/03/2024 14:07");
    }

    #[test]
    fn test_sale_request_builder() {
        let req = SaleRequest::new(1, 2, 3)
            .with_payment("pix", serde_json::json!({"chave": "x"}))
            .with_expected_total(Money::from_cents(300));
        assert_eq!(req.payment_kind, "pix");
        assert_eq!(req.expected_total, Some(Money::from_cents(300)));
    }
}
