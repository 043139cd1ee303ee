//! # Pricing Runtime
//!
//! Builds the pricing services from a [`PricingConfig`].
//!
//! ## Wiring
//! ```text
//! PricingConfig
//!   ├── [storage] ──► Database ──► SqliteKvStore ──┐
//!   │                                              ▼
//!   │                               PreferenceStore (SystemClock, TTL)
//!   │                                   │            │
//!   ├── [api] ──► HttpApiClient ──► CurrencyResolver  RateFetcher
//!   │                  │                  └─────┬────┘
//!   │                  │                        ▼
//!   │                  │                 CurrencyContext ──► subscribe()
//!   │                  ▼                        │
//!   └── [checkout] ──► CheckoutSession ◄────────┘ (watch::Receiver)
//! ```

use std::sync::Arc;
use tracing::info;

use gloventra_store::{Database, KeyValueStore};

use crate::checkout::CheckoutSession;
use crate::client::{CurrencyDetector, HttpApiClient, RateProvider, ShippingQuoteService};
use crate::clock::{Clock, SystemClock};
use crate::config::PricingConfig;
use crate::context::CurrencyContext;
use crate::error::PricingResult;
use crate::preference::PreferenceStore;
use crate::rates::RateFetcher;
use crate::resolver::CurrencyResolver;

/// Collaborators the runtime is assembled from.
pub struct Services {
    pub store: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
    pub detector: Arc<dyn CurrencyDetector>,
    pub rates: Arc<dyn RateProvider>,
    pub quotes: Arc<dyn ShippingQuoteService>,
}

/// The assembled pricing layer for one session.
pub struct PricingRuntime {
    config: PricingConfig,
    database: Option<Database>,
    quotes: Arc<dyn ShippingQuoteService>,
    context: CurrencyContext,
}

impl PricingRuntime {
    /// Opens storage and the HTTP client described by `config`.
    ///
    /// No network call is made until [`CurrencyContext::initialize`].
    pub async fn open(config: PricingConfig) -> PricingResult<Self> {
        config.validate()?;

        let database = Database::new(config.db_config()).await?;
        let client = HttpApiClient::from_config(&config)?;

        info!(
            api = %config.api.base_url,
            canonical = %config.canonical_currency(),
            "Pricing runtime opened"
        );

        let services = Services {
            store: Arc::new(database.kv()),
            clock: Arc::new(SystemClock),
            detector: Arc::new(client.clone()),
            rates: Arc::new(client.clone()),
            quotes: Arc::new(client),
        };

        let mut runtime = Self::with_services(config, services);
        runtime.database = Some(database);
        Ok(runtime)
    }

    /// Assembles the runtime from explicit collaborators.
    pub fn with_services(config: PricingConfig, services: Services) -> Self {
        let preferences = PreferenceStore::new(services.store, services.clock, config.rates_ttl());

        let resolver = CurrencyResolver::new(
            preferences.clone(),
            services.detector,
            config.detect_timeout(),
            config.locale(),
        );
        let fetcher = RateFetcher::new(
            preferences.clone(),
            services.rates,
            config.request_timeout(),
        );

        let context = CurrencyContext::new(
            config.canonical_currency(),
            config.default_currency(),
            preferences,
            resolver,
            fetcher,
        );

        PricingRuntime {
            config,
            database: None,
            quotes: services.quotes,
            context,
        }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub fn context(&self) -> &CurrencyContext {
        &self.context
    }

    /// Starts a checkout that follows the context's currency.
    pub fn checkout_session(&self) -> CheckoutSession {
        CheckoutSession::new(
            self.config.checkout_policy(),
            self.quotes.clone(),
            self.config.request_timeout(),
            self.context.subscribe(),
        )
    }

    /// Closes the database pool, if this runtime opened one.
    pub async fn close(&self) {
        if let Some(database) = &self.database {
            database.close().await;
        }
    }
}
