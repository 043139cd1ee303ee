//! # gloventra-core: Pure Pricing Logic for the Gloventra Storefront
//!
//! This crate is the **heart** of Gloventra pricing. It holds the currency
//! catalog, conversion and formatting, and checkout arithmetic as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Gloventra Pricing Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Storefront UI                                │   │
//! │  │    Product cards ──► Cart ──► Checkout ──► Order summary        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 gloventra-pricing (async layer)                 │   │
//! │  │   CurrencyContext, CurrencyResolver, RateFetcher, Checkout      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ gloventra-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │ currency │ │ convert  │ │ checkout │ │validation│          │   │
//! │  │   │ catalog  │ │ format   │ │  totals  │ │ address  │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORAGE • NO NETWORK • NO CLOCK READS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          gloventra-store (key-value persistence)                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`currency`] - Supported currencies and locale fallback
//! - [`rates`] - Exchange rate snapshots
//! - [`convert`] - Conversion through a base currency, price formatting
//! - [`checkout`] - Subtotal, shipping, tax and total
//! - [`money`] - Money type with integer arithmetic
//! - [`types`] - Cart, shipping and tax input types
//! - [`error`] - Domain error types
//! - [`validation`] - Checkout input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use gloventra_core::convert::convert_and_format;
//! use gloventra_core::rates::ExchangeRateSnapshot;
//!
//! let rates = ExchangeRateSnapshot::new("USD", [("JPY".to_string(), 150.0)], Utc::now());
//! assert_eq!(convert_and_format(8.23, "USD", "JPY", Some(&rates)), "¥1,235");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod convert;
pub mod currency;
pub mod error;
pub mod money;
pub mod rates;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{calculate_checkout, CheckoutCalculation, CheckoutDisplay, CheckoutPolicy};
pub use convert::{convert, convert_and_format, format_price};
pub use currency::{Currency, CurrencyCode};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use rates::ExchangeRateSnapshot;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single item in cart.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum unit price accepted into a cart, in cents (100 million).
pub const MAX_PRICE_CENTS: i64 = 10_000_000_000;

/// Maximum shipping quote accepted, in major units of the quoted currency.
pub const MAX_SHIPPING_RATE: f64 = 10_000_000.0;
