//! # Remote Service Clients
//!
//! Collaborator traits for the three storefront API calls, and the
//! `reqwest` implementation used in production.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  RateProvider          GET  {base}/currency/rates?base=USD              │
//! │                        ◄──  { "base": "USD", "rates": { "EUR": 0.92 } } │
//! │                                                                         │
//! │  CurrencyDetector      GET  {base}/currency/detect                      │
//! │                        ◄──  { "currency": "EUR" }                       │
//! │                                                                         │
//! │  ShippingQuoteService  POST {base}/shipping/rates                       │
//! │                        ──►  { destinationCountry, ..., currency }       │
//! │                        ◄──  { "shippingOptions": [ ... ] }              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each client call returns a [`PricingResult`]. Callers in this crate turn
//! errors into fallbacks; nothing here retries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use gloventra_core::currency::CurrencyCode;
use gloventra_core::{ShippingOption, ShippingRateRequest};

use crate::config::PricingConfig;
use crate::error::{PricingError, PricingResult};

// =============================================================================
// Wire Types
// =============================================================================

/// Rate table as returned by the rate provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatesResponse {
    pub base: String,
    #[serde(default)]
    pub rates: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShippingRatesResponse {
    #[serde(default)]
    shipping_options: Vec<ShippingOption>,
}

#[derive(Debug, Serialize)]
struct ShippingQuoteBody<'a> {
    #[serde(flatten)]
    request: &'a ShippingRateRequest,
    currency: &'a str,
}

// =============================================================================
// Collaborator Traits
// =============================================================================

/// Source of live exchange rates.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_rates(&self, base: &CurrencyCode) -> PricingResult<RatesResponse>;
}

/// IP-based currency detection.
#[async_trait]
pub trait CurrencyDetector: Send + Sync {
    /// Returns a supported currency or an error. Never returns a code
    /// outside the catalog.
    async fn detect_currency(&self) -> PricingResult<CurrencyCode>;
}

/// Carrier quotes for a parcel.
#[async_trait]
pub trait ShippingQuoteService: Send + Sync {
    async fn quote(
        &self,
        request: &ShippingRateRequest,
        currency: &CurrencyCode,
    ) -> PricingResult<Vec<ShippingOption>>;
}

// =============================================================================
// Response Checks
// =============================================================================

/// Accepts a rate table only if it is for the requested base.
pub fn check_rates_response(
    requested: &CurrencyCode,
    response: RatesResponse,
) -> PricingResult<RatesResponse> {
    let base = CurrencyCode::parse(&response.base)
        .map_err(|e| PricingError::InvalidResponse(format!("rates base: {e}")))?;

    if &base != requested {
        return Err(PricingError::InvalidResponse(format!(
            "asked for {requested} rates, got {base}"
        )));
    }

    Ok(response)
}

fn check_detect_response(response: DetectResponse) -> PricingResult<CurrencyCode> {
    let raw = response
        .currency
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| PricingError::InvalidResponse("detection returned no currency".into()))?;

    let code = CurrencyCode::parse(&raw)
        .map_err(|e| PricingError::InvalidResponse(format!("detected currency: {e}")))?;

    if !code.is_supported() {
        return Err(PricingError::UnsupportedCurrency(code.to_string()));
    }

    Ok(code)
}

// =============================================================================
// HTTP Client
// =============================================================================

/// `reqwest` client for the storefront API.
#[derive(Clone)]
pub struct HttpApiClient {
    inner: Arc<HttpApiClientInner>,
}

struct HttpApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpApiClient {
    /// Creates a client rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the URL is not http(s) or the HTTP client fails
    /// to build.
    pub fn new(base_url: &str, request_timeout: Duration) -> PricingResult<Self> {
        let mut url = Url::parse(base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PricingError::InvalidUrl(format!(
                "API URL must be http or https, got: {base_url}"
            )));
        }

        // Url::join replaces the last segment unless the base ends in '/'
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpApiClientInner {
                client,
                base_url: url,
            }),
        })
    }

    /// Creates a client from the `[api]` config section.
    pub fn from_config(config: &PricingConfig) -> PricingResult<Self> {
        Self::new(&config.api.base_url, config.request_timeout())
    }

    /// Absolute URL of an endpoint below the base.
    pub fn endpoint(&self, path: &str) -> PricingResult<Url> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: Url) -> PricingResult<T> {
        debug!(url = %url, "GET");
        let response = self.inner.client.get(url).send().await?;
        Self::handle_response(response).await
    }

    async fn post<T: serde::de::DeserializeOwned, B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> PricingResult<T> {
        debug!(url = %url, "POST");
        let response = self.inner.client.post(url).json(body).send().await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> PricingResult<T> {
        let status = response.status();

        if !status.is_success() {
            return Err(PricingError::HttpStatus {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl std::fmt::Debug for HttpApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish()
    }
}

#[async_trait]
impl RateProvider for HttpApiClient {
    async fn fetch_rates(&self, base: &CurrencyCode) -> PricingResult<RatesResponse> {
        let mut url = self.endpoint("currency/rates")?;
        url.query_pairs_mut().append_pair("base", base.as_str());

        let response: RatesResponse = self.get(url).await?;
        check_rates_response(base, response)
    }
}

#[async_trait]
impl CurrencyDetector for HttpApiClient {
    async fn detect_currency(&self) -> PricingResult<CurrencyCode> {
        let url = self.endpoint("currency/detect")?;
        let response: DetectResponse = self.get(url).await?;
        check_detect_response(response)
    }
}

#[async_trait]
impl ShippingQuoteService for HttpApiClient {
    async fn quote(
        &self,
        request: &ShippingRateRequest,
        currency: &CurrencyCode,
    ) -> PricingResult<Vec<ShippingOption>> {
        let url = self.endpoint("shipping/rates")?;
        let body = ShippingQuoteBody {
            request,
            currency: currency.as_str(),
        };

        let response: ShippingRatesResponse = self.post(url, &body).await?;
        Ok(response.shipping_options)
    }
}
