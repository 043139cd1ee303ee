//! Fakes and fixtures shared by the unit tests.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gloventra_core::currency::CurrencyCode;
use gloventra_core::{ShippingOption, ShippingRateRequest};
use gloventra_store::MemoryKvStore;

use crate::client::{CurrencyDetector, RateProvider, RatesResponse, ShippingQuoteService};
use crate::clock::ManualClock;
use crate::error::{PricingError, PricingResult};
use crate::preference::PreferenceStore;

/// Fixed start time for every manual clock.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

/// In-memory preference store with a one hour TTL.
pub fn preferences() -> (Arc<MemoryKvStore>, Arc<ManualClock>, PreferenceStore) {
    init_tracing();
    let kv = Arc::new(MemoryKvStore::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let prefs = PreferenceStore::new(kv.clone(), clock.clone(), chrono::Duration::hours(1));
    (kv, clock, prefs)
}

/// Installs a test subscriber once; `RUST_LOG` controls the filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn unavailable() -> PricingError {
    PricingError::ConnectionFailed("connection refused".into())
}

// =============================================================================
// Detector
// =============================================================================

pub struct FakeDetector {
    answer: Option<CurrencyCode>,
    delay: Duration,
    calls: AtomicUsize,
}

impl FakeDetector {
    pub fn answering(code: &str) -> Self {
        FakeDetector {
            answer: Some(CurrencyCode::parse(code).unwrap()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        FakeDetector {
            answer: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CurrencyDetector for FakeDetector {
    async fn detect_currency(&self) -> PricingResult<CurrencyCode> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.answer.clone().ok_or_else(unavailable)
    }
}

// =============================================================================
// Rate Provider
// =============================================================================

pub struct FakeRateProvider {
    response: RatesResponse,
    failing: AtomicBool,
    delay: Duration,
    calls: AtomicUsize,
}

impl FakeRateProvider {
    pub fn answering(base: &str, rates: &[(&str, f64)]) -> Self {
        FakeRateProvider {
            response: RatesResponse {
                base: base.to_string(),
                rates: rates
                    .iter()
                    .map(|(code, rate)| (code.to_string(), *rate))
                    .collect::<BTreeMap<_, _>>(),
            },
            failing: AtomicBool::new(false),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        let provider = FakeRateProvider::answering("USD", &[]);
        provider.set_failing(true);
        provider
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateProvider for FakeRateProvider {
    async fn fetch_rates(&self, _base: &CurrencyCode) -> PricingResult<RatesResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self.response.clone())
    }
}

// =============================================================================
// Shipping Quotes
// =============================================================================

pub struct FakeQuoteService {
    options: Mutex<Vec<ShippingOption>>,
    failing: AtomicBool,
    requests: Mutex<Vec<(ShippingRateRequest, CurrencyCode)>>,
}

impl FakeQuoteService {
    pub fn answering(options: Vec<ShippingOption>) -> Self {
        FakeQuoteService {
            options: Mutex::new(options),
            failing: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<(ShippingRateRequest, CurrencyCode)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ShippingQuoteService for FakeQuoteService {
    async fn quote(
        &self,
        request: &ShippingRateRequest,
        currency: &CurrencyCode,
    ) -> PricingResult<Vec<ShippingOption>> {
        self.requests
            .lock()
            .unwrap()
            .push((request.clone(), currency.clone()));
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self.options.lock().unwrap().clone())
    }
}

/// A carrier quote in USD.
pub fn option(id: &str, rate: f64) -> ShippingOption {
    ShippingOption {
        id: id.to_string(),
        carrier: "DHL".to_string(),
        service_name: format!("{id} service"),
        rate,
        currency: "USD".to_string(),
        estimated_days: 3,
        tracking_available: true,
    }
}
