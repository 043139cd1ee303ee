//! # Currency Resolver
//!
//! Picks the active currency at startup.
//!
//! ## Resolution Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. Stored preference ──── found ──────────────────────► Stored         │
//! │         │ absent                                                        │
//! │         ▼                                                               │
//! │  2. IP detection (bounded by timeout) ── ok ── persist ─► Detected      │
//! │         │ error / timeout                                               │
//! │         ▼                                                               │
//! │  3. Locale table (default USD) ────────────────────────► Locale         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each step short-circuits. Resolution always produces a supported
//! currency.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use gloventra_core::currency::{currency_from_locale, CurrencyCode};

use crate::client::CurrencyDetector;
use crate::error::PricingError;
use crate::preference::PreferenceStore;

/// Which step of the chain produced the currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    /// The user's persisted choice.
    Stored,
    /// The detection service answered in time.
    Detected,
    /// Derived from the locale tag.
    Locale,
}

impl std::fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionSource::Stored => write!(f, "stored"),
            ResolutionSource::Detected => write!(f, "detected"),
            ResolutionSource::Locale => write!(f, "locale"),
        }
    }
}

/// Outcome of [`CurrencyResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub currency: CurrencyCode,
    pub source: ResolutionSource,
}

impl Resolution {
    /// Whether the network step was skipped or failed.
    pub fn is_fallback(&self) -> bool {
        self.source == ResolutionSource::Locale
    }
}

/// Stored → detected → locale resolution.
#[derive(Clone)]
pub struct CurrencyResolver {
    preferences: PreferenceStore,
    detector: Arc<dyn CurrencyDetector>,
    detect_timeout: Duration,
    locale: String,
}

impl CurrencyResolver {
    pub fn new(
        preferences: PreferenceStore,
        detector: Arc<dyn CurrencyDetector>,
        detect_timeout: Duration,
        locale: impl Into<String>,
    ) -> Self {
        CurrencyResolver {
            preferences,
            detector,
            detect_timeout,
            locale: locale.into(),
        }
    }

    /// Resolves the active currency. Never fails.
    ///
    /// A detected currency is persisted so the next session resolves from
    /// storage. The locale fallback is not persisted, so detection is
    /// retried next session.
    pub async fn resolve(&self) -> Resolution {
        if let Some(currency) = self.preferences.get_stored_currency().await {
            debug!(currency = %currency, "Using stored currency");
            return Resolution {
                currency,
                source: ResolutionSource::Stored,
            };
        }

        match self.detect().await {
            Ok(currency) => {
                info!(currency = %currency, "Detected currency from IP");
                self.preferences.store_currency(&currency).await;
                Resolution {
                    currency,
                    source: ResolutionSource::Detected,
                }
            }
            Err(err) => {
                let currency = currency_from_locale(&self.locale);
                warn!(
                    error = %err,
                    locale = %self.locale,
                    currency = %currency,
                    "Currency detection failed, using locale"
                );
                Resolution {
                    currency,
                    source: ResolutionSource::Locale,
                }
            }
        }
    }

    async fn detect(&self) -> Result<CurrencyCode, PricingError> {
        let detected = timeout(self.detect_timeout, self.detector.detect_currency())
            .await
            .map_err(|_| PricingError::Timeout(self.detect_timeout))??;

        // detectors must only return catalog codes
        if !detected.is_supported() {
            return Err(PricingError::UnsupportedCurrency(detected.to_string()));
        }

        Ok(detected)
    }
}

impl std::fmt::Debug for CurrencyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrencyResolver")
            .field("detect_timeout", &self.detect_timeout)
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}
