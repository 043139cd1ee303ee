//! # Rate Fetcher
//!
//! Produces an exchange rate snapshot for a base currency, falling back
//! through progressively less accurate sources.
//!
//! ## Fallback Tiers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  fresh cache for base? ── yes ──────────────────────────► Cached        │
//! │         │ no                                                            │
//! │         ▼                                                               │
//! │  live provider call (bounded) ── ok ── cache it ────────► Live          │
//! │         │ error / timeout                                               │
//! │         ▼                                                               │
//! │  any cached snapshot for base? ── yes ──────────────────► Stale         │
//! │         │ no                                                            │
//! │         ▼                                                               │
//! │  every supported currency at rate 1 ────────────────────► Identity      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use gloventra_core::currency::CurrencyCode;
use gloventra_core::rates::ExchangeRateSnapshot;

use crate::client::RateProvider;
use crate::error::{PricingError, PricingResult};
use crate::preference::PreferenceStore;

/// A snapshot together with how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum RateOutcome {
    /// Fresh snapshot from the cache; no network call was made.
    Cached(ExchangeRateSnapshot),
    /// Just fetched from the provider and written to the cache.
    Live(ExchangeRateSnapshot),
    /// Provider failed; an expired cached snapshot is served instead.
    Stale(ExchangeRateSnapshot),
    /// Provider failed and nothing was cached; all rates are 1.
    Identity(ExchangeRateSnapshot),
}

impl RateOutcome {
    pub fn snapshot(&self) -> &ExchangeRateSnapshot {
        match self {
            RateOutcome::Cached(s)
            | RateOutcome::Live(s)
            | RateOutcome::Stale(s)
            | RateOutcome::Identity(s) => s,
        }
    }

    pub fn into_snapshot(self) -> ExchangeRateSnapshot {
        match self {
            RateOutcome::Cached(s)
            | RateOutcome::Live(s)
            | RateOutcome::Stale(s)
            | RateOutcome::Identity(s) => s,
        }
    }

    /// True for the two tiers served after a provider failure.
    pub fn is_degraded(&self) -> bool {
        matches!(self, RateOutcome::Stale(_) | RateOutcome::Identity(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RateOutcome::Cached(_) => "cached",
            RateOutcome::Live(_) => "live",
            RateOutcome::Stale(_) => "stale",
            RateOutcome::Identity(_) => "identity",
        }
    }
}

/// Cache-first rate fetching.
#[derive(Clone)]
pub struct RateFetcher {
    preferences: PreferenceStore,
    provider: Arc<dyn RateProvider>,
    fetch_timeout: Duration,
}

impl RateFetcher {
    pub fn new(
        preferences: PreferenceStore,
        provider: Arc<dyn RateProvider>,
        fetch_timeout: Duration,
    ) -> Self {
        RateFetcher {
            preferences,
            provider,
            fetch_timeout,
        }
    }

    /// Returns rates for `base`. Never fails.
    pub async fn fetch_rates(&self, base: &CurrencyCode) -> RateOutcome {
        if let Some(cached) = self.preferences.get_cached_rates().await {
            if cached.is_for_base(base.as_str()) {
                debug!(base = %base, "Serving fresh cached rates");
                return RateOutcome::Cached(cached);
            }
            debug!(base = %base, cached_base = %cached.base, "Cached rates are for another base");
        }

        let err = match self.fetch_live(base).await {
            Ok(snapshot) => {
                if !self.preferences.cache_rates(&snapshot).await {
                    warn!(base = %base, "Fetched rates could not be cached");
                }
                info!(base = %base, currencies = snapshot.rates.len(), "Fetched live rates");
                return RateOutcome::Live(snapshot);
            }
            Err(err) => err,
        };

        match self.preferences.get_raw_cached_rates().await {
            Some(stale) if stale.is_for_base(base.as_str()) => {
                warn!(
                    base = %base,
                    error = %err,
                    fetched_at = %stale.fetched_at,
                    "Rate fetch failed, serving stale rates"
                );
                RateOutcome::Stale(stale)
            }
            _ => {
                warn!(
                    base = %base,
                    error = %err,
                    "Rate fetch failed with nothing cached, using identity rates"
                );
                RateOutcome::Identity(ExchangeRateSnapshot::identity(
                    base.as_str(),
                    self.preferences.now(),
                ))
            }
        }
    }

    async fn fetch_live(&self, base: &CurrencyCode) -> PricingResult<ExchangeRateSnapshot> {
        let response = timeout(self.fetch_timeout, self.provider.fetch_rates(base))
            .await
            .map_err(|_| PricingError::Timeout(self.fetch_timeout))??;

        Ok(ExchangeRateSnapshot::new(
            response.base,
            response.rates,
            self.preferences.now(),
        ))
    }
}

impl std::fmt::Debug for RateFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateFetcher")
            .field("fetch_timeout", &self.fetch_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preference::RATES_KEY;
    use crate::test_support::{preferences, t0, FakeRateProvider};
    use chrono::Duration as ChronoDuration;
    use gloventra_core::currency::list_supported;
    use gloventra_store::KeyValueStore;

    const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

    fn usd() -> CurrencyCode {
        CurrencyCode::usd()
    }

    #[tokio::test]
    async fn test_live_fetch_is_cached() {
        let (kv, _, prefs) = preferences();
        let provider = Arc::new(FakeRateProvider::answering("USD", &[("EUR", 0.92)]));
        let fetcher = RateFetcher::new(prefs, provider.clone(), FETCH_TIMEOUT);

        let outcome = fetcher.fetch_rates(&usd()).await;
        assert!(matches!(outcome, RateOutcome::Live(_)));
        assert_eq!(outcome.snapshot().rate_for("EUR"), 0.92);
        assert_eq!(outcome.snapshot().fetched_at, t0());
        assert!(kv.get(RATES_KEY).await.unwrap().is_some());

        let again = fetcher.fetch_rates(&usd()).await;
        assert!(matches!(again, RateOutcome::Cached(_)));
        assert_eq!(again.snapshot(), outcome.snapshot());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_freshness_boundary() {
        let (_, clock, prefs) = preferences();
        let provider = Arc::new(FakeRateProvider::answering("USD", &[("EUR", 0.92)]));
        let fetcher = RateFetcher::new(prefs, provider.clone(), FETCH_TIMEOUT);

        fetcher.fetch_rates(&usd()).await;

        clock.set(t0() + ChronoDuration::hours(1) - ChronoDuration::milliseconds(1));
        assert!(matches!(fetcher.fetch_rates(&usd()).await, RateOutcome::Cached(_)));
        assert_eq!(provider.calls(), 1);

        clock.set(t0() + ChronoDuration::hours(1) + ChronoDuration::milliseconds(1));
        assert!(matches!(fetcher.fetch_rates(&usd()).await, RateOutcome::Live(_)));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_serves_stale_rates() {
        let (_, clock, prefs) = preferences();
        let provider = Arc::new(FakeRateProvider::answering("USD", &[("JPY", 150.0)]));
        let fetcher = RateFetcher::new(prefs, provider.clone(), FETCH_TIMEOUT);
        fetcher.fetch_rates(&usd()).await;

        clock.advance(ChronoDuration::hours(5));
        provider.set_failing(true);

        let outcome = fetcher.fetch_rates(&usd()).await;
        assert!(matches!(outcome, RateOutcome::Stale(_)));
        assert!(outcome.is_degraded());
        assert_eq!(outcome.snapshot().rate_for("JPY"), 150.0);
        assert_eq!(outcome.snapshot().fetched_at, t0());
    }

    #[tokio::test]
    async fn test_failure_without_cache_is_identity() {
        let (_, _, prefs) = preferences();
        let provider = Arc::new(FakeRateProvider::failing());
        let fetcher = RateFetcher::new(prefs, provider, FETCH_TIMEOUT);

        let outcome = fetcher.fetch_rates(&usd()).await;
        assert_eq!(outcome.kind(), "identity");

        let snapshot = outcome.into_snapshot();
        assert_eq!(snapshot.base, "USD");
        for currency in list_supported() {
            assert_eq!(snapshot.rates[currency.code], 1.0);
        }
    }

    #[tokio::test]
    async fn test_cache_for_other_base_is_not_used() {
        let (_, _, prefs) = preferences();
        let eur_provider = Arc::new(FakeRateProvider::answering("EUR", &[("USD", 1.08)]));
        RateFetcher::new(prefs.clone(), eur_provider, FETCH_TIMEOUT)
            .fetch_rates(&CurrencyCode::parse("EUR").unwrap())
            .await;

        let failing = Arc::new(FakeRateProvider::failing());
        let outcome = RateFetcher::new(prefs, failing.clone(), FETCH_TIMEOUT)
            .fetch_rates(&usd())
            .await;

        assert_eq!(failing.calls(), 1);
        assert!(matches!(outcome, RateOutcome::Identity(_)));
        assert!(outcome.snapshot().is_for_base("USD"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out() {
        let (_, _, prefs) = preferences();
        let provider = Arc::new(
            FakeRateProvider::answering("USD", &[("EUR", 0.92)])
                .with_delay(Duration::from_secs(60)),
        );
        let fetcher = RateFetcher::new(prefs, provider, FETCH_TIMEOUT);

        let outcome = fetcher.fetch_rates(&usd()).await;
        assert!(matches!(outcome, RateOutcome::Identity(_)));
    }

    #[tokio::test]
    async fn test_storage_outage_still_returns_live_rates() {
        let (kv, _, prefs) = preferences();
        kv.set_failing(true);
        let provider = Arc::new(FakeRateProvider::answering("USD", &[("GBP", 0.79)]));
        let fetcher = RateFetcher::new(prefs, provider.clone(), FETCH_TIMEOUT);

        assert!(matches!(fetcher.fetch_rates(&usd()).await, RateOutcome::Live(_)));
        assert!(matches!(fetcher.fetch_rates(&usd()).await, RateOutcome::Live(_)));
        assert_eq!(provider.calls(), 2);
    }
}
