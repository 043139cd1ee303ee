//! # Currency Context
//!
//! The session's active currency and rate snapshot, owned by one writer
//! and observed by any number of readers.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   CurrencyContext (single writer)                                       │
//! │     initialize()    ── CurrencyResolver ──┐                             │
//! │     set_currency()  ── PreferenceStore ───┼──► watch::Sender            │
//! │     refresh_rates() ── RateFetcher ───────┘        │                    │
//! │                                                    │ full-value replace │
//! │                        ┌───────────────────────────┼────────────┐       │
//! │                        ▼                           ▼            ▼       │
//! │                  product cards               cart summary   checkout    │
//! │                  (watch::Receiver<CurrencyView>, read only)             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rates are always fetched against the canonical currency. Changing the
//! display currency only changes how amounts are rendered.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use gloventra_core::convert;
use gloventra_core::currency::CurrencyCode;
use gloventra_core::rates::ExchangeRateSnapshot;

use crate::error::{PricingError, PricingResult};
use crate::preference::PreferenceStore;
use crate::rates::{RateFetcher, RateOutcome};
use crate::resolver::{CurrencyResolver, Resolution, ResolutionSource};

/// What readers see.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyView {
    /// Display currency.
    pub currency: CurrencyCode,

    /// How `currency` was chosen; `None` until resolution finishes.
    pub source: Option<ResolutionSource>,

    /// Latest snapshot against the canonical currency, `None` until the
    /// first fetch completes.
    pub rates: Option<Arc<ExchangeRateSnapshot>>,

    /// Whether `rates` came from a stale cache or the identity fallback.
    pub rates_degraded: bool,

    /// True while startup resolution is running.
    pub is_loading: bool,
}

impl CurrencyView {
    fn initial(currency: CurrencyCode) -> Self {
        CurrencyView {
            currency,
            source: None,
            rates: None,
            rates_degraded: false,
            is_loading: true,
        }
    }

    /// Converts from `from` into the display currency and formats it.
    ///
    /// Before the first rate fetch the amount is formatted unconverted in
    /// `from`.
    pub fn convert_and_format(&self, amount: f64, from: &str) -> String {
        convert::convert_and_format(amount, from, self.currency.as_str(), self.rates.as_deref())
    }
}

/// Owner of the session's currency state.
pub struct CurrencyContext {
    canonical: CurrencyCode,
    preferences: PreferenceStore,
    resolver: CurrencyResolver,
    fetcher: RateFetcher,
    state_tx: watch::Sender<CurrencyView>,
}

impl CurrencyContext {
    /// Creates the context showing `initial` until [`initialize`](Self::initialize) runs.
    pub fn new(
        canonical: CurrencyCode,
        initial: CurrencyCode,
        preferences: PreferenceStore,
        resolver: CurrencyResolver,
        fetcher: RateFetcher,
    ) -> Self {
        let (state_tx, _) = watch::channel(CurrencyView::initial(initial));

        CurrencyContext {
            canonical,
            preferences,
            resolver,
            fetcher,
            state_tx,
        }
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<CurrencyView> {
        self.state_tx.subscribe()
    }

    /// Returns a copy of the current state.
    pub fn current(&self) -> CurrencyView {
        self.state_tx.borrow().clone()
    }

    pub fn currency(&self) -> CurrencyCode {
        self.state_tx.borrow().currency.clone()
    }

    pub fn canonical_currency(&self) -> &CurrencyCode {
        &self.canonical
    }

    /// Resolves the display currency, then loads rates.
    ///
    /// `is_loading` stays true until both steps finish.
    pub async fn initialize(&self) -> Resolution {
        self.state_tx.send_modify(|view| view.is_loading = true);

        let resolution = self.resolver.resolve().await;
        info!(
            currency = %resolution.currency,
            source = %resolution.source,
            "Currency resolved"
        );

        self.state_tx.send_modify(|view| {
            view.currency = resolution.currency.clone();
            view.source = Some(resolution.source);
        });

        self.refresh_rates().await;

        self.state_tx.send_modify(|view| view.is_loading = false);
        resolution
    }

    /// Switches the display currency and persists the choice.
    ///
    /// Rejects malformed codes and currencies outside the catalog. A
    /// storage failure does not block the switch.
    pub async fn set_currency(&self, code: &str) -> PricingResult<CurrencyCode> {
        let currency = CurrencyCode::parse(code)?;
        if !currency.is_supported() {
            warn!(currency = %currency, "Rejected unsupported currency");
            return Err(PricingError::UnsupportedCurrency(currency.to_string()));
        }

        if !self.preferences.store_currency(&currency).await {
            debug!(currency = %currency, "Currency choice kept for this session only");
        }

        self.state_tx.send_modify(|view| {
            view.currency = currency.clone();
            view.source = Some(ResolutionSource::Stored);
        });

        // rates are keyed by the canonical base, so this is normally a cache hit
        self.refresh_rates().await;

        Ok(currency)
    }

    /// Fetches rates against the canonical currency and publishes them.
    pub async fn refresh_rates(&self) -> RateOutcome {
        let outcome = self.fetcher.fetch_rates(&self.canonical).await;
        debug!(outcome = outcome.kind(), "Rates refreshed");

        let degraded = outcome.is_degraded();
        let snapshot = Arc::new(outcome.snapshot().clone());
        self.state_tx.send_modify(|view| {
            view.rates = Some(snapshot);
            view.rates_degraded = degraded;
        });

        outcome
    }

    /// Formats `amount` (in `from`) in the current display currency.
    pub fn convert_and_format(&self, amount: f64, from: &str) -> String {
        self.state_tx.borrow().convert_and_format(amount, from)
    }

    /// Formats a canonical-currency amount in the display currency.
    pub fn format_canonical(&self, amount: f64) -> String {
        self.convert_and_format(amount, self.canonical.as_str())
    }
}

impl std::fmt::Debug for CurrencyContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrencyContext")
            .field("canonical", &self.canonical)
            .field("view", &*self.state_tx.borrow())
            .finish_non_exhaustive()
    }
}
