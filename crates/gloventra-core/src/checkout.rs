//! # Checkout Total Calculator
//!
//! Derives order totals from the cart, the shipping selection and the
//! checkout policy.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     calculate_checkout()                                │
//! │                                                                         │
//! │  CartLine[] ──► subtotal = Σ price × qty                   (cents)      │
//! │                     │                                                   │
//! │  empty cart? ───────┼── yes ──► shipping = 0                            │
//! │                     │                                                   │
//! │  selected option? ──┼── yes ──► shipping = option.rate (in canonical)  │
//! │                     │                                                   │
//! │                     └── no ───► subtotal > threshold ? 0 : flat fee     │
//! │                                                                         │
//! │  tax   = subtotal × tax_rate                               (cents)      │
//! │  total = subtotal + shipping + tax                         (cents)      │
//! │                                                                         │
//! │  CheckoutCalculation ──► display(rates) ──► four formatted strings     │
//! │                          (only place the display currency applies)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A calculation is a value: it is recomputed from scratch on every input
//! change and never patched.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::convert::{convert, convert_and_format};
use crate::currency::CurrencyCode;
use crate::money::Money;
use crate::rates::ExchangeRateSnapshot;
use crate::types::{CartLine, ShippingOption, TaxRate};

/// Label shown instead of a zero shipping amount.
pub const FREE_SHIPPING_LABEL: &str = "Free";

// =============================================================================
// Policy
// =============================================================================

/// Flat checkout rules, all amounts in the canonical currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPolicy {
    /// Currency cart prices and policy amounts are denominated in.
    pub canonical_currency: CurrencyCode,

    /// Flat tax applied to the subtotal.
    pub tax_rate: TaxRate,

    /// Subtotals strictly above this ship for free.
    pub free_shipping_threshold: Money,

    /// Shipping charged when no option is selected and the threshold is not met.
    pub flat_shipping_fee: Money,
}

impl Default for CheckoutPolicy {
    fn default() -> Self {
        CheckoutPolicy {
            canonical_currency: CurrencyCode::usd(),
            tax_rate: TaxRate::from_bps(1000),
            free_shipping_threshold: Money::from_cents(10_000),
            flat_shipping_fee: Money::from_cents(1_000),
        }
    }
}

impl CheckoutPolicy {
    /// Shipping charged when the customer has not picked a carrier.
    pub fn default_shipping(&self, subtotal: Money) -> (Money, ShippingSource) {
        if subtotal > self.free_shipping_threshold {
            (Money::zero(), ShippingSource::FreeOverThreshold)
        } else {
            (self.flat_shipping_fee, ShippingSource::FlatFee)
        }
    }
}

// =============================================================================
// Calculation
// =============================================================================

/// Where the shipping amount came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum ShippingSource {
    /// A quoted carrier option chosen by the customer.
    Selected,
    /// No selection and the subtotal cleared the free-shipping threshold.
    FreeOverThreshold,
    /// No selection (or no quotes) and the flat fee applies.
    FlatFee,
    /// The cart is empty, so nothing ships.
    NotRequired,
}

/// Order totals in the canonical currency, tagged with the display currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutCalculation {
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,

    /// Currency the totals are presented in.
    #[ts(type = "string")]
    pub currency: CurrencyCode,

    /// Currency the totals are computed in.
    #[ts(type = "string")]
    pub canonical_currency: CurrencyCode,

    pub shipping_source: ShippingSource,
}

/// Checkout totals rendered for the display currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutDisplay {
    pub subtotal: String,
    /// `"Free"` when shipping is zero.
    pub shipping: String,
    pub tax: String,
    pub total: String,
}

/// Computes checkout totals.
///
/// `rates` is only consulted when the selected option was quoted in a
/// currency other than the canonical one. Without rates such an option is
/// taken at face value.
///
/// ## Example
/// ```rust
/// use gloventra_core::checkout::{calculate_checkout, CheckoutPolicy};
/// use gloventra_core::currency::CurrencyCode;
/// use gloventra_core::types::CartLine;
/// use gloventra_core::Money;
///
/// let lines = vec![
///     CartLine::new("shirt", Money::from_cents(1000), 2),
///     CartLine::new("socks", Money::from_cents(500), 1),
/// ];
/// let calc = calculate_checkout(
///     &lines,
///     None,
///     &CheckoutPolicy::default(),
///     &CurrencyCode::usd(),
///     None,
/// );
/// assert_eq!(calc.subtotal.cents(), 2500);
/// assert_eq!(calc.shipping.cents(), 1000);
/// assert_eq!(calc.tax.cents(), 250);
/// assert_eq!(calc.total.cents(), 3750);
/// ```
pub fn calculate_checkout(
    lines: &[CartLine],
    selected: Option<&ShippingOption>,
    policy: &CheckoutPolicy,
    currency: &CurrencyCode,
    rates: Option<&ExchangeRateSnapshot>,
) -> CheckoutCalculation {
    let subtotal: Money = lines.iter().map(CartLine::line_total).sum();

    let (shipping, shipping_source) = match selected {
        _ if lines.is_empty() => (Money::zero(), ShippingSource::NotRequired),
        Some(option) => (
            shipping_in_canonical(option, &policy.canonical_currency, rates),
            ShippingSource::Selected,
        ),
        None => policy.default_shipping(subtotal),
    };

    let tax = subtotal.calculate_tax(policy.tax_rate);

    CheckoutCalculation {
        subtotal,
        shipping,
        tax,
        total: subtotal + shipping + tax,
        currency: currency.clone(),
        canonical_currency: policy.canonical_currency.clone(),
        shipping_source,
    }
}

/// Converts a quoted option's rate into canonical cents.
///
/// Negative or non-finite rates count as zero.
pub fn shipping_in_canonical(
    option: &ShippingOption,
    canonical: &CurrencyCode,
    rates: Option<&ExchangeRateSnapshot>,
) -> Money {
    let rate = match rates {
        Some(rates) => convert(option.rate, &option.currency, canonical.as_str(), rates),
        None => option.rate,
    };
    Money::from_major(rate.max(0.0))
}

impl CheckoutCalculation {
    /// Whether every amount is zero (the empty-cart result).
    pub fn is_empty(&self) -> bool {
        self.total.is_zero() && self.subtotal.is_zero()
    }

    /// Formats the four amounts in the display currency.
    ///
    /// Without rates the amounts are shown unconverted in the canonical
    /// currency.
    pub fn display(&self, rates: Option<&ExchangeRateSnapshot>) -> CheckoutDisplay {
        let render = |amount: Money| {
            convert_and_format(
                amount.to_major(),
                self.canonical_currency.as_str(),
                self.currency.as_str(),
                rates,
            )
        };

        CheckoutDisplay {
            subtotal: render(self.subtotal),
            shipping: if self.shipping.is_zero() {
                FREE_SHIPPING_LABEL.to_string()
            } else {
                render(self.shipping)
            },
            tax: render(self.tax),
            total: render(self.total),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
