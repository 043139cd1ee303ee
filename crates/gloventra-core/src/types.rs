//! # Domain Types
//!
//! Input types the pricing core consumes from its collaborators.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    CartLine     │   │ ShippingOption  │   │ShippingAddress  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  product_id     │   │  id, carrier    │   │  full_name      │       │
//! │  │  price          │   │  rate, currency │   │  city, country  │       │
//! │  │  quantity       │   │  estimated_days │   │  postal_code    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │   from Cart UI          from shipping quotes   from checkout form      │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────────┐                        │
//! │  │    TaxRate      │   │ ShippingRateRequest  │                        │
//! │  │  bps (u32)      │   │ destination + weight │                        │
//! │  │  1000 = 10%     │   │ + items              │                        │
//! │  └─────────────────┘   └──────────────────────┘                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All of these are read-only inputs. The core never mutates a cart line or
//! a quoted shipping option.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1000 bps = 10% (the storefront's flat checkout rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// One line of the shopping cart, priced in the canonical currency.
///
/// On the wire the price is a major-unit number (`{"price": 10.99}`), as
/// the storefront's cart payloads send it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product identifier from the catalog.
    pub product_id: String,

    /// Unit price in the canonical currency.
    #[serde(with = "crate::money::major_units")]
    #[ts(type = "number")]
    pub price: Money,

    /// Quantity in cart (positive).
    pub quantity: u32,
}

impl CartLine {
    /// Creates a cart line.
    pub fn new(product_id: impl Into<String>, price: Money, quantity: u32) -> Self {
        CartLine {
            product_id: product_id.into(),
            price,
            quantity,
        }
    }

    /// Unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }
}

// =============================================================================
// Shipping
// =============================================================================

/// A carrier quote returned by the shipping-quote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShippingOption {
    /// Quote identifier, e.g. `dhl-express`.
    pub id: String,

    /// Carrier name, e.g. `DHL`.
    pub carrier: String,

    /// Human-readable service name.
    #[serde(default)]
    pub service_name: String,

    /// Quoted price in major units of `currency`.
    pub rate: f64,

    /// Currency the rate was quoted in.
    pub currency: String,

    /// Estimated transit time in days.
    pub estimated_days: u32,

    /// Whether the carrier provides tracking.
    #[serde(default)]
    pub tracking_available: bool,
}

/// A delivery address entered at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
}

impl ShippingAddress {
    /// Whether enough of the destination is known to ask carriers for quotes.
    pub fn is_quotable(&self) -> bool {
        !self.country.trim().is_empty()
            && !self.city.trim().is_empty()
            && !self.postal_code.trim().is_empty()
    }
}

/// An item in a shipping-rate request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRequestItem {
    pub product_id: String,
    pub quantity: u32,
    /// Unit price in major units of the canonical currency.
    pub price: f64,
}

/// Body of a shipping-rate request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRateRequest {
    pub destination_country: String,
    pub destination_city: String,
    pub destination_postal_code: String,
    /// Total parcel weight in kilograms.
    pub weight: f64,
    pub items: Vec<RateRequestItem>,
}

/// Average parcel weight attributed to one unit of any product.
pub const WEIGHT_PER_UNIT_KG: f64 = 0.5;

/// Estimates parcel weight from cart quantities.
///
/// ## Example
/// ```rust
/// use gloventra_core::types::{shipping_weight_kg, CartLine};
/// use gloventra_core::Money;
///
/// let lines = vec![
///     CartLine::new("a", Money::from_cents(1000), 2),
///     CartLine::new("b", Money::from_cents(500), 1),
/// ];
/// assert_eq!(shipping_weight_kg(&lines), 1.5);
/// ```
pub fn shipping_weight_kg(lines: &[CartLine]) -> f64 {
    lines
        .iter()
        .map(|line| line.quantity as f64 * WEIGHT_PER_UNIT_KG)
        .sum()
}

impl ShippingRateRequest {
    /// Builds a quote request for a destination and the current cart.
    pub fn for_cart(destination: &ShippingAddress, lines: &[CartLine]) -> Self {
        ShippingRateRequest {
            destination_country: destination.country.trim().to_string(),
            destination_city: destination.city.trim().to_string(),
            destination_postal_code: destination.postal_code.trim().to_string(),
            weight: shipping_weight_kg(lines),
            items: lines
                .iter()
                .map(|line| RateRequestItem {
                    product_id: line.product_id.clone(),
                    quantity: line.quantity,
                    price: line.price.to_major(),
                })
                .collect(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
