//! # gloventra-pricing: Async Pricing Layer for the Gloventra Storefront
//!
//! This crate connects the pure pricing core to storage and the storefront
//! API: it resolves the shopper's currency, keeps exchange rates fresh, and
//! prices a checkout in the display currency.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pricing Layer Architecture                       │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 CurrencyContext (single writer)                  │  │
//! │  │                                                                  │  │
//! │  │  initialize() · set_currency() · refresh_rates()                 │  │
//! │  │  publishes CurrencyView over a watch channel                     │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │CurrencyResolver│  │  RateFetcher   │  │  CheckoutSession       │    │
//! │  │                │  │                │  │                        │    │
//! │  │ stored →       │  │ fresh cache →  │  │ cart + destination →   │    │
//! │  │ detect (bound) │  │ live → stale → │  │ quotes → totals in     │    │
//! │  │ → locale       │  │ identity       │  │ display currency       │    │
//! │  └───────┬────────┘  └───────┬────────┘  └───────────┬────────────┘    │
//! │          │                   │                       │                  │
//! │          ▼                   ▼                       ▼                  │
//! │  ┌────────────────────────────────────┐  ┌────────────────────────┐    │
//! │  │ PreferenceStore (KeyValueStore+TTL)│  │ HttpApiClient (reqwest)│    │
//! │  └────────────────────────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! │  No public operation here returns a network or storage error: each     │
//! │  one yields an outcome value that names the fallback it used.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - `pricing.toml` + `GLOVENTRA_*` environment configuration
//! - [`error`] - Pricing error types
//! - [`clock`] - Injectable clock
//! - [`preference`] - Persisted currency and rate cache
//! - [`client`] - Service traits and the HTTP implementation
//! - [`resolver`] - Startup currency resolution
//! - [`rates`] - Cache-first rate fetching
//! - [`context`] - Shared currency state
//! - [`checkout`] - Checkout session
//! - [`runtime`] - Wiring from configuration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gloventra_pricing::{PricingConfig, PricingRuntime};
//!
//! let config = PricingConfig::load_or_default(None);
//! let runtime = PricingRuntime::open(config).await?;
//!
//! let resolution = runtime.context().initialize().await;
//! println!("Currency: {} ({})", resolution.currency, resolution.source);
//!
//! let mut checkout = runtime.checkout_session();
//! checkout.set_cart(lines).await?;
//! checkout.set_destination(address).await;
//! println!("Total: {}", checkout.display().total);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod client;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod preference;
pub mod rates;
pub mod resolver;
pub mod runtime;

#[cfg(test)]
mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{CheckoutSession, QuoteStatus};
pub use client::{
    CurrencyDetector, HttpApiClient, RateProvider, RatesResponse, ShippingQuoteService,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::PricingConfig;
pub use context::{CurrencyContext, CurrencyView};
pub use error::{PricingError, PricingResult};
pub use preference::PreferenceStore;
pub use rates::{RateFetcher, RateOutcome};
pub use resolver::{CurrencyResolver, Resolution, ResolutionSource};
pub use runtime::{PricingRuntime, Services};
