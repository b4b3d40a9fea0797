//! # Validation Module
//!
//! Input validation for Vitrine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (vitrine-api)                                   │
//! │  ├── Form fields arrive as strings                                     │
//! │  └── parse_id / parse_quantity / Money::parse_decimal                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Business rules (positive quantity, non-negative price)            │
//! │  └── Runs before any SQL                                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (preco >= 0, quantidade_estoque >= 0)           │
//! │  ├── UNIQUE (loja_id, produto_id)                                      │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vitrine_core::validation::{parse_quantity, validate_quantity};
//!
//! let qty = parse_quantity(Some("2")).unwrap();
//! validate_quantity(qty).unwrap();
//! assert_eq!(parse_quantity(None).unwrap(), 1);
//! ```

use crate::error::ValidationError;
use crate::types::{InventoryUpsert, NewProduct, NewStore};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest name accepted for products, stores and payment methods.
pub const MAX_NAME_LEN: usize = 200;

/// Longest free-text field (descriptions, addresses).
pub const MAX_TEXT_LEN: usize = 2000;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required display name and returns it trimmed.
///
/// ## Example
/// ```rust
/// use vitrine_core::validation::validate_name;
///
/// assert_eq!(validate_name("nome", "  Caneca  ").unwrap(), "Caneca");
/// assert!(validate_name("nome", "   ").is_err());
/// ```
pub fn validate_name(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(value.to_string())
}

/// Normalizes an optional free-text field: blank becomes `None`.
pub fn normalize_text(field: &str, value: Option<&str>) -> ValidationResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) if text.chars().count() > MAX_TEXT_LEN => Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LEN,
        }),
        Some(text) => Ok(Some(text.to_string())),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - No upper bound: stock is the only limit
///
/// ## User Workflow
/// ```text
/// POST /vendas (quantidade=0)
///      │
///      ▼
/// validate_quantity(0) ← THIS FUNCTION
///      │
///      └── qty <= 0 → InvalidArgument, no transaction opened
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantidade".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock level. Zero is allowed.
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::OutOfRange {
            field: "quantidade_estoque".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a price in centavos. Zero is allowed (free items).
///
/// ## Example
/// ```rust
/// use vitrine_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "preco".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a row identifier.
pub fn validate_id(field: &str, id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Form Field Parsers
// =============================================================================

/// Parses a required identifier form field.
///
/// ## Example
/// ```rust
/// use vitrine_core::validation::parse_id;
///
/// assert_eq!(parse_id("loja_id", Some("3")).unwrap(), 3);
/// assert!(parse_id("loja_id", None).is_err());
/// assert!(parse_id("loja_id", Some("abc")).is_err());
/// assert!(parse_id("loja_id", Some("0")).is_err());
/// ```
pub fn parse_id(field: &str, value: Option<&str>) -> ValidationResult<i64> {
    let raw = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ValidationError::required(field))?;

    let id = raw
        .parse::<i64>()
        .map_err(|_| ValidationError::invalid_format(field, format!("'{raw}' is not an integer")))?;

    validate_id(field, id)?;
    Ok(id)
}

/// Parses the `quantidade` form field. Missing means one unit.
pub fn parse_quantity(value: Option<&str>) -> ValidationResult<i64> {
    let field = "quantidade";
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(1),
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| ValidationError::invalid_format(field, format!("'{raw}' is not an integer"))),
    }
}

/// Parses an optional non-negative integer field (e.g. `quantidade_estoque`).
pub fn parse_optional_count(field: &str, value: Option<&str>) -> ValidationResult<Option<i64>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ValidationError::invalid_format(field, format!("'{raw}' is not an integer"))),
    }
}

/// Parses the `detalhes` field: a JSON object, or nothing.
///
/// ## Example
/// ```rust
/// use vitrine_core::validation::parse_payment_details;
///
/// assert!(parse_payment_details(None).unwrap().is_object());
/// assert!(parse_payment_details(Some(r#"{"parcelas": 2}"#)).is_ok());
/// assert!(parse_payment_details(Some("[1, 2]")).is_err());
/// ```
pub fn parse_payment_details(value: Option<&str>) -> ValidationResult<serde_json::Value> {
    let field = "detalhes";
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(serde_json::Value::Object(serde_json::Map::new())),
        Some(raw) => {
            let parsed: serde_json::Value = serde_json::from_str(raw)
                .map_err(|e| ValidationError::invalid_format(field, e.to_string()))?;
            if parsed.is_object() {
                Ok(parsed)
            } else {
                Err(ValidationError::invalid_format(field, "must be a JSON object"))
            }
        }
    }
}

// =============================================================================
// Entity Validators
// =============================================================================

/// Validates a product before insert/update.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_name("nome", &product.name)?;
    validate_price_cents(product.price_cents)?;
    validate_id("categoria_id", product.category_id)?;
    Ok(())
}

/// Validates a store before insert.
pub fn validate_new_store(store: &NewStore) -> ValidationResult<()> {
    validate_name("nome", &store.name)?;
    Ok(())
}

/// Validates an inventory association before upsert.
pub fn validate_inventory_upsert(entry: &InventoryUpsert) -> ValidationResult<()> {
    validate_id("loja_id", entry.store_id)?;
    validate_id("produto_id", entry.product_id)?;
    validate_stock_quantity(entry.stock_quantity)?;
    if let Some(price) = entry.store_price_cents {
        validate_price_cents(price)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("nome", "Loja Centro").unwrap(), "Loja Centro");
        assert!(validate_name("nome", "").is_err());
        assert!(validate_name("nome", &"A".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("descricao", None).unwrap(), None);
        assert_eq!(normalize_text("descricao", Some("  ")).unwrap(), None);
        assert_eq!(
            normalize_text("descricao", Some(" azul ")).unwrap(),
            Some("azul".to_string())
        );
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(10_000).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_stock_quantity() {
        assert!(validate_stock_quantity(0).is_ok());
        assert!(validate_stock_quantity(-1).is_err());
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(None).unwrap(), 1);
        assert_eq!(parse_quantity(Some("")).unwrap(), 1);
        assert_eq!(parse_quantity(Some("4")).unwrap(), 4);
        // Parsed but not validated here; the fulfillment core rejects it.
        assert_eq!(parse_quantity(Some("-2")).unwrap(), -2);
        assert!(parse_quantity(Some("dois")).is_err());
    }

    #[test]
    fn test_parse_optional_count() {
        assert_eq!(parse_optional_count("quantidade_estoque", None).unwrap(), None);
        assert_eq!(parse_optional_count("quantidade_estoque", Some("7")).unwrap(), Some(7));
        assert!(parse_optional_count("quantidade_estoque", Some("x")).is_err());
    }

    #[test]
    fn test_validate_inventory_upsert() {
        let mut entry = InventoryUpsert {
            store_id: 1,
            product_id: 1,
            stock_quantity: 5,
            store_price_cents: Some(900),
        };
        assert!(validate_inventory_upsert(&entry).is_ok());

        entry.store_price_cents = Some(-1);
        assert!(validate_inventory_upsert(&entry).is_err());

        entry.store_price_cents = None;
        entry.stock_quantity = -3;
        assert!(validate_inventory_upsert(&entry).is_err());
    }

    #[test]
    fn test_validate_new_product() {
        let product = NewProduct {
            name: "Caneca".to_string(),
            description: None,
            price_cents: 2500,
            category_id: 1,
        };
        assert!(validate_new_product(&product).is_ok());

        let free = NewProduct {
            price_cents: 0,
            ..product.clone()
        };
        assert!(validate_new_product(&free).is_ok());

        let negative = NewProduct {
            price_cents: -1,
            ..product
        };
        assert!(validate_new_product(&negative).is_err());
    }
}
