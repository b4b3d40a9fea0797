//! # Money Module
//!
//! The `Money` type: an amount in centavos, stored and computed as `i64`.
//!
//! ## Where Amounts Come From
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AMOUNT SOURCES                                                         │
//! │                                                                         │
//! │  HTTP form "preco=20.00"  ──► parse_decimal ──► Money(2000)             │
//! │  produtos.preco           ──► from_cents    ──► Money(2000)             │
//! │  produtos_lojas.preco_loja (overrides catalog price when present)       │
//! │                                                                         │
//! │  unit price × quantidade  ──► checked_multiply_quantity                 │
//! │                               (None on overflow, never wraps)           │
//! │                                                                         │
//! │  There is no float constructor. "0.1 + 0.2" never happens here.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vitrine_core::money::Money;
//!
//! let price = Money::from_cents(1099);       // R$ 10,99
//! let total = price.checked_multiply_quantity(3).unwrap();
//! assert_eq!(total.cents(), 3297);
//! assert_eq!(total.to_string(), "R$ 32,97");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in centavos.
///
/// Amounts in this system are never negative (prices, totals, sale values),
/// but the inner `i64` is kept signed to match SQLite's INTEGER affinity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    ///
    /// ## Example
    /// ```rust
    /// use vitrine_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole reais portion.
    #[inline]
    pub const fn reais(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the centavos portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Parses a decimal amount as typed into a form.
    ///
    /// Accepts `"20"`, `"20.5"`, `"20.50"` and the comma form `"20,50"`.
    /// Rejects more than two fractional digits, signs, and anything that is
    /// not a plain number.
    ///
    /// ## Example
    /// ```rust
    /// use vitrine_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("20.00").unwrap().cents(), 2000);
    /// assert_eq!(Money::parse_decimal("7,5").unwrap().cents(), 750);
    /// assert!(Money::parse_decimal("1.999").is_err());
    /// assert!(Money::parse_decimal("-3").is_err());
    /// ```
    ///
    /// ## User Workflow
    /// ```text
    /// POST /itens  (preco=20.00)
    ///      │
    ///      ▼
    /// parse_decimal("20.00") ← THIS FUNCTION
    ///      │
    ///      ▼
    /// produtos.preco = 2000
    /// ```
    pub fn parse_decimal(input: &str) -> Result<Money, ValidationError> {
        let field = "preco";
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::required(field));
        }

        let normalized = trimmed.replace(',', ".");
        let (whole, fraction) = match normalized.split_once('.') {
            Some((w, f)) => (w, f),
            None => (normalized.as_str(), ""),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::invalid_format(
                field,
                format!("'{trimmed}' is not a decimal amount"),
            ));
        }
        if fraction.len() > 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::invalid_format(
                field,
                "at most two decimal places are allowed",
            ));
        }

        let overflow = || ValidationError::invalid_format(field, "amount is too large");
        let reais: i64 = whole.parse().map_err(|_| overflow())?;
        let centavos: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| overflow())? * 10,
            _ => fraction.parse().map_err(|_| overflow())?,
        };

        reais
            .checked_mul(100)
            .and_then(|c| c.checked_add(centavos))
            .map(Money)
            .ok_or_else(overflow)
    }

    /// Multiplies a unit price by a quantity, refusing to overflow.
    ///
    /// ## Example
    /// ```rust
    /// use vitrine_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(1000);
    /// assert_eq!(unit_price.checked_multiply_quantity(2).unwrap().cents(), 2000);
    /// assert!(Money::from_cents(i64::MAX).checked_multiply_quantity(2).is_none());
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Brazilian notation: `R$ 1.234,56`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let reais = self.reais().unsigned_abs().to_string();

        let mut grouped = String::with_capacity(reais.len() + reais.len() / 3);
        for (i, ch) in reais.chars().enumerate() {
            if i > 0 && (reais.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        write!(f, "{}R$ {},{:02}", sign, grouped, self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
