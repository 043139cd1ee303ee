//! # Money Module
//!
//! Provides the `Money` type for amounts in the store's canonical currency.
//!
//! ## Where Floats Stop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CANONICAL ARITHMETIC vs PRESENTATION                                   │
//! │                                                                         │
//! │  Catalog price (USD) ──► Money (integer cents)                          │
//! │                             │                                           │
//! │                             ├── subtotal = Σ price × qty   (cents)     │
//! │                             ├── tax      = subtotal × 10%  (cents)     │
//! │                             └── total    = sub + ship + tax (cents)    │
//! │                                           │                             │
//! │                                           ▼                             │
//! │                             to_major() ──► convert() ──► format()      │
//! │                                  f64 only from here on                  │
//! │                                                                         │
//! │  Rounding error never compounds: converted values are never summed.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use gloventra_core::money::Money;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let line = price * 2u32;
//! assert_eq!(line.cents(), 2198);
//! assert_eq!(Money::from_major(10.99), price);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Sub};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in minor units (cents) of the canonical store currency.
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds, discounts
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Canonical only**: Money never holds a converted amount. Display
///   currencies are reached through `convert` on the f64 major value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use gloventra_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from a major-unit amount (e.g. `25.5` dollars).
    ///
    /// Rounds half away from zero to the nearest cent. Non-finite input
    /// yields zero.
    ///
    /// ## Example
    /// ```rust
    /// use gloventra_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(22.5).cents(), 2250);
    /// assert_eq!(Money::from_major(0.125).cents(), 13);
    /// assert_eq!(Money::from_major(f64::NAN).cents(), 0);
    /// ```
    pub fn from_major(amount: f64) -> Self {
        if !amount.is_finite() {
            return Money::zero();
        }
        Money((amount * 100.0).round() as i64)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the value in major units as f64, for conversion and display.
    ///
    /// ## Example
    /// ```rust
    /// use gloventra_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(3750).to_major(), 37.5);
    /// ```
    #[inline]
    pub fn to_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
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

    /// Calculates tax at a flat rate, rounding half up to the cent.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`.
    /// The +5000 provides rounding (5000/10000 = 0.5).
    ///
    /// ## Example
    /// ```rust
    /// use gloventra_core::money::Money;
    /// use gloventra_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(2500); // $25.00
    /// let tax = subtotal.calculate_tax(TaxRate::from_bps(1000)); // 10%
    /// assert_eq!(tax.cents(), 250);
    /// ```
    ///
    /// ## Checkout Flow
    /// ```text
    /// Subtotal: $25.00
    ///      │
    ///      ▼
    /// calculate_tax(10%) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Tax: $2.50 ──► Total: $25.00 + shipping + $2.50
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 keeps large baskets from overflowing the intermediate product
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-style rendering in the canonical currency.
///
/// ## Note
/// Storefront display goes through `convert::format_price` so that the
/// active currency's symbol and precision apply.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

// Arithmetic saturates at the i64 bounds.

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

/// Multiplication by quantity.
impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        Money(self.0.saturating_mul(i64::from(qty)))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Wire Format
// =============================================================================

/// Serde adapter carrying `Money` as a major-unit number (`10.99`).
///
/// The storefront's cart payloads use major units; use with
/// `#[serde(with = "crate::money::major_units")]`.
pub mod major_units {
    use super::Money;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(money: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(money.to_major())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        if !amount.is_finite() {
            return Err(serde::de::Error::custom("amount must be a finite number"));
        }
        Ok(Money::from_major(amount))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_from_major_rounds_to_cent() {
        assert_eq!(Money::from_major(25.0).cents(), 2500);
        assert_eq!(Money::from_major(100.01).cents(), 10001);
        assert_eq!(Money::from_major(-5.5).cents(), -550);
        assert_eq!(Money::from_major(f64::INFINITY).cents(), 0);
    }

    #[test]
    fn test_to_major() {
        assert_eq!(Money::from_cents(250).to_major(), 2.5);
        assert_eq!(Money::zero().to_major(), 0.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        let result: Money = a * 3u32;
        assert_eq!(result.cents(), 3000);
    }

    #[test]
    fn test_sum() {
        let total: Money = [1000, 2000, 500].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), 3500);

        let empty: Money = std::iter::empty::<Money>().sum();
        assert!(empty.is_zero());
    }

    #[test]
    fn test_tax_calculation_flat_ten_percent() {
        let rate = TaxRate::from_bps(1000);
        assert_eq!(Money::from_cents(2500).calculate_tax(rate).cents(), 250);
        assert_eq!(Money::from_cents(10001).calculate_tax(rate).cents(), 1000);
        // $0.05 × 10% = $0.005 → $0.01
        assert_eq!(Money::from_cents(5).calculate_tax(rate).cents(), 1);
    }

    #[test]
    fn test_arithmetic_saturates() {
        let huge = Money::from_cents(i64::MAX / 2);
        assert_eq!((huge * 3u32).cents(), i64::MAX);
        assert_eq!((huge + huge + huge).cents(), i64::MAX);
        assert_eq!((Money::from_cents(i64::MIN) - huge).cents(), i64::MIN);

        let total: Money = [i64::MAX, 1].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), i64::MAX);

        // from_major saturates the cast; adding to it must still not panic
        let quoted = Money::from_major(1e300);
        assert_eq!((quoted + Money::from_cents(2500)).cents(), i64::MAX);
    }

    #[test]
    fn test_tax_on_saturated_amount() {
        let tax = Money::from_cents(i64::MAX).calculate_tax(TaxRate::from_bps(1000));
        assert_eq!(tax.cents(), 922_337_203_685_477_581);
    }
}
