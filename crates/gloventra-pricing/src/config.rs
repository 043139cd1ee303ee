//! # Pricing Configuration
//!
//! Configuration management for the pricing layer.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     GLOVENTRA_API_URL=https://shop.example.com/api                     │
//! │     GLOVENTRA_CURRENCY=EUR                                             │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/pricing/pricing.toml (Linux)                             │
//! │     ~/Library/Application Support/com.gloventra.pricing/pricing.toml   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     localhost API, USD, 10% tax, free shipping over 100.00             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # pricing.toml
//! [api]
//! base_url = "http://localhost:3000/api"
//! request_timeout_ms = 10000
//! detect_timeout_ms = 3000
//!
//! [currency]
//! canonical = "USD"
//! default = "USD"
//! locale = "en-GB"      # optional, otherwise read from LC_ALL / LANG
//! rates_ttl_secs = 3600
//!
//! [checkout]
//! tax_rate_bps = 1000
//! free_shipping_threshold_cents = 10000
//! flat_shipping_fee_cents = 1000
//!
//! [storage]
//! database_path = "/var/lib/gloventra/pricing.db"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use gloventra_core::checkout::CheckoutPolicy;
use gloventra_core::currency::{CurrencyCode, DEFAULT_CURRENCY};
use gloventra_core::validation::validate_tax_rate_bps;
use gloventra_core::{Money, TaxRate};
use gloventra_store::DbConfig;

use crate::error::{PricingError, PricingResult};

/// Locale used when neither config nor environment names one.
pub const FALLBACK_LOCALE: &str = "en-US";

/// Upper bound for `rates_ttl_secs` (30 days).
pub const MAX_RATES_TTL_SECS: u64 = 30 * 24 * 3600;

// =============================================================================
// API Settings
// =============================================================================

/// Remote service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL of the storefront API; endpoint paths are appended to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bound on rate and shipping-quote requests (milliseconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Bound on the currency detection call (milliseconds).
    #[serde(default = "default_detect_timeout")]
    pub detect_timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_request_timeout() -> u64 {
    10_000
}

fn default_detect_timeout() -> u64 {
    3_000
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout(),
            detect_timeout_ms: default_detect_timeout(),
        }
    }
}

// =============================================================================
// Currency Settings
// =============================================================================

/// Currency resolution and rate caching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencySettings {
    /// Currency all prices are authored in. Rates are fetched against it.
    #[serde(default = "default_currency_code")]
    pub canonical: String,

    /// Display currency before resolution finishes.
    #[serde(default = "default_currency_code")]
    pub default: String,

    /// Locale tag for the last-resort fallback (e.g. "en-GB").
    #[serde(default)]
    pub locale: Option<String>,

    /// How long cached rates count as fresh (seconds).
    #[serde(default = "default_rates_ttl")]
    pub rates_ttl_secs: u64,
}

fn default_currency_code() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_rates_ttl() -> u64 {
    gloventra_core::rates::DEFAULT_RATES_TTL_SECS.unsigned_abs()
}

impl Default for CurrencySettings {
    fn default() -> Self {
        CurrencySettings {
            canonical: default_currency_code(),
            default: default_currency_code(),
            locale: None,
            rates_ttl_secs: default_rates_ttl(),
        }
    }
}

// =============================================================================
// Checkout Settings
// =============================================================================

/// Checkout pricing rules, in minor units of the canonical currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSettings {
    #[serde(default = "default_tax_rate")]
    pub tax_rate_bps: u32,

    /// Subtotals strictly above this ship free.
    #[serde(default = "default_free_threshold")]
    pub free_shipping_threshold_cents: i64,

    #[serde(default = "default_flat_fee")]
    pub flat_shipping_fee_cents: i64,
}

fn default_tax_rate() -> u32 {
    1000
}

fn default_free_threshold() -> i64 {
    10_000
}

fn default_flat_fee() -> i64 {
    1_000
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        CheckoutSettings {
            tax_rate_bps: default_tax_rate(),
            free_shipping_threshold_cents: default_free_threshold(),
            flat_shipping_fee_cents: default_flat_fee(),
        }
    }
}

// =============================================================================
// Storage Settings
// =============================================================================

/// Where preferences and cached rates live.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// SQLite file. `None` keeps everything in memory for the process.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

// =============================================================================
// Main Pricing Configuration
// =============================================================================

/// Complete pricing configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub currency: CurrencySettings,

    #[serde(default)]
    pub checkout: CheckoutSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

impl PricingConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (pricing.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> PricingResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading pricing config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load pricing config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> PricingResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| PricingError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PricingError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)
            .map_err(|e| PricingError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Pricing config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> PricingResult<()> {
        let url = Url::parse(&self.api.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PricingError::InvalidUrl(format!(
                "API URL must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if self.api.request_timeout_ms == 0 || self.api.detect_timeout_ms == 0 {
            return Err(PricingError::InvalidConfig(
                "timeouts must be greater than 0".into(),
            ));
        }

        for (field, value) in [
            ("currency.canonical", &self.currency.canonical),
            ("currency.default", &self.currency.default),
        ] {
            let code = CurrencyCode::parse(value)?;
            if !code.is_supported() {
                return Err(PricingError::InvalidConfig(format!(
                    "{} is not a supported currency: {}",
                    field, value
                )));
            }
        }

        if self.currency.rates_ttl_secs == 0 || self.currency.rates_ttl_secs > MAX_RATES_TTL_SECS {
            return Err(PricingError::InvalidConfig(format!(
                "rates_ttl_secs must be between 1 and {}",
                MAX_RATES_TTL_SECS
            )));
        }

        validate_tax_rate_bps(self.checkout.tax_rate_bps)?;

        if self.checkout.free_shipping_threshold_cents < 0
            || self.checkout.flat_shipping_fee_cents < 0
        {
            return Err(PricingError::InvalidConfig(
                "shipping amounts must not be negative".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any variable source.
    ///
    /// ## Variables
    /// ```text
    /// GLOVENTRA_API_URL             → api.base_url
    /// GLOVENTRA_REQUEST_TIMEOUT_MS  → api.request_timeout_ms
    /// GLOVENTRA_DETECT_TIMEOUT_MS   → api.detect_timeout_ms
    /// GLOVENTRA_CURRENCY            → currency.default
    /// GLOVENTRA_LOCALE              → currency.locale
    /// GLOVENTRA_RATES_TTL_SECS      → currency.rates_ttl_secs
    /// GLOVENTRA_DB_PATH             → storage.database_path
    /// ```
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("GLOVENTRA_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Some(ms) = lookup("GLOVENTRA_REQUEST_TIMEOUT_MS") {
            match ms.parse::<u64>() {
                Ok(ms) => self.api.request_timeout_ms = ms,
                Err(_) => warn!(value = %ms, "Ignoring invalid GLOVENTRA_REQUEST_TIMEOUT_MS"),
            }
        }

        if let Some(ms) = lookup("GLOVENTRA_DETECT_TIMEOUT_MS") {
            match ms.parse::<u64>() {
                Ok(ms) => self.api.detect_timeout_ms = ms,
                Err(_) => warn!(value = %ms, "Ignoring invalid GLOVENTRA_DETECT_TIMEOUT_MS"),
            }
        }

        if let Some(code) = lookup("GLOVENTRA_CURRENCY") {
            debug!(currency = %code, "Overriding default currency from environment");
            self.currency.default = code.trim().to_uppercase();
        }

        if let Some(locale) = lookup("GLOVENTRA_LOCALE") {
            self.currency.locale = Some(locale);
        }

        if let Some(secs) = lookup("GLOVENTRA_RATES_TTL_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) => self.currency.rates_ttl_secs = secs,
                Err(_) => warn!(value = %secs, "Ignoring invalid GLOVENTRA_RATES_TTL_SECS"),
            }
        }

        if let Some(path) = lookup("GLOVENTRA_DB_PATH") {
            self.storage.database_path = Some(PathBuf::from(path));
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "gloventra", "pricing")
            .map(|dirs| dirs.config_dir().join("pricing.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.api.request_timeout_ms)
    }

    pub fn detect_timeout(&self) -> Duration {
        Duration::from_millis(self.api.detect_timeout_ms)
    }

    pub fn rates_ttl(&self) -> chrono::Duration {
        let secs = self.currency.rates_ttl_secs.min(MAX_RATES_TTL_SECS);
        chrono::Duration::seconds(secs as i64)
    }

    /// Canonical currency, USD if the configured value is unusable.
    pub fn canonical_currency(&self) -> CurrencyCode {
        supported_or_usd(&self.currency.canonical)
    }

    /// Initial display currency, USD if the configured value is unusable.
    pub fn default_currency(&self) -> CurrencyCode {
        supported_or_usd(&self.currency.default)
    }

    /// Locale for the fallback step: config, then process environment.
    pub fn locale(&self) -> String {
        self.currency
            .locale
            .clone()
            .unwrap_or_else(|| system_locale(|key| std::env::var(key).ok()))
    }

    /// Checkout rules built from the `[checkout]` section.
    pub fn checkout_policy(&self) -> CheckoutPolicy {
        CheckoutPolicy {
            canonical_currency: self.canonical_currency(),
            tax_rate: TaxRate::from_bps(self.checkout.tax_rate_bps),
            free_shipping_threshold: Money::from_cents(self.checkout.free_shipping_threshold_cents),
            flat_shipping_fee: Money::from_cents(self.checkout.flat_shipping_fee_cents),
        }
    }

    /// Database settings, in-memory when no path is configured.
    pub fn db_config(&self) -> DbConfig {
        match &self.storage.database_path {
            Some(path) => DbConfig::new(path),
            None => DbConfig::in_memory(),
        }
    }
}

fn supported_or_usd(raw: &str) -> CurrencyCode {
    CurrencyCode::parse(raw)
        .ok()
        .filter(CurrencyCode::is_supported)
        .unwrap_or_else(CurrencyCode::usd)
}

/// Reads the process locale from POSIX variables.
///
/// `LC_ALL` wins over `LANG`. Encoding and modifier suffixes are dropped
/// (`de_DE.UTF-8@euro` → `de_DE`). `C`/`POSIX` and unset fall back to
/// [`FALLBACK_LOCALE`].
pub fn system_locale<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    ["LC_ALL", "LANG"]
        .iter()
        .filter_map(|key| lookup(key))
        .map(|raw| {
            raw.split(['.', '@'])
                .next()
                .unwrap_or_default()
                .trim()
                .to_string()
        })
        .find(|tag| !tag.is_empty() && tag != "C" && tag != "POSIX")
        .unwrap_or_else(|| FALLBACK_LOCALE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = PricingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api.base_url, "http://localhost:3000/api");
        assert_eq!(config.detect_timeout(), Duration::from_secs(3));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.rates_ttl(), chrono::Duration::hours(1));
        assert_eq!(config.canonical_currency().as_str(), "USD");
    }

    #[test]
    fn test_checkout_policy_from_config() {
        let policy = PricingConfig::default().checkout_policy();
        assert_eq!(policy.tax_rate.bps(), 1000);
        assert_eq!(policy.free_shipping_threshold.cents(), 10_000);
        assert_eq!(policy.flat_shipping_fee.cents(), 1_000);
    }

    #[test]
    fn test_config_validation() {
        let mut config = PricingConfig::default();

        config.api.base_url = "ftp://example.com".into();
        assert!(config.validate().unwrap_err().is_config_error());

        config.api.base_url = "not a url".into();
        assert!(config.validate().is_err());

        config.api.base_url = "https://shop.example.com/api".into();
        assert!(config.validate().is_ok());

        config.currency.default = "CHF".into();
        assert!(config.validate().is_err());

        config.currency.default = "eur".into();
        assert!(config.validate().is_ok());

        config.api.detect_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_fee_rejected() {
        let mut config = PricingConfig::default();
        config.checkout.flat_shipping_fee_cents = -1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = PricingConfig::default();
        config.apply_overrides(env(&[
            ("GLOVENTRA_API_URL", "https://shop.example.com/api"),
            ("GLOVENTRA_CURRENCY", " gbp "),
            ("GLOVENTRA_DETECT_TIMEOUT_MS", "1500"),
            ("GLOVENTRA_REQUEST_TIMEOUT_MS", "soon"),
            ("GLOVENTRA_LOCALE", "ja-JP"),
            ("GLOVENTRA_DB_PATH", "/tmp/pricing.db"),
        ]));

        assert_eq!(config.api.base_url, "https://shop.example.com/api");
        assert_eq!(config.default_currency().as_str(), "GBP");
        assert_eq!(config.detect_timeout(), Duration::from_millis(1500));
        // unparseable value leaves the default
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.locale(), "ja-JP");
        assert!(!config.db_config().database_path.to_string_lossy().contains("memory"));
    }

    #[test]
    fn test_system_locale() {
        assert_eq!(system_locale(env(&[("LANG", "de_DE.UTF-8")])), "de_DE");
        assert_eq!(
            system_locale(env(&[("LC_ALL", "en_GB"), ("LANG", "fr_FR.UTF-8")])),
            "en_GB"
        );
        assert_eq!(system_locale(env(&[("LANG", "fr_FR@euro")])), "fr_FR");
        assert_eq!(system_locale(env(&[("LANG", "C.UTF-8")])), FALLBACK_LOCALE);
        assert_eq!(system_locale(env(&[])), FALLBACK_LOCALE);
    }

    #[test]
    fn test_unusable_currency_falls_back_to_usd() {
        let mut config = PricingConfig::default();
        config.currency.canonical = "XX".into();
        assert_eq!(config.canonical_currency().as_str(), "USD");
    }

    #[test]
    fn test_partial_toml() {
        let config: PricingConfig = toml::from_str(
            r#"
            [currency]
            default = "EUR"
            "#,
        )
        .unwrap();

        assert_eq!(config.currency.default, "EUR");
        assert_eq!(config.currency.canonical, "USD");
        assert_eq!(config.checkout.tax_rate_bps, 1000);
    }

    #[test]
    fn test_toml_serialization() {
        let config = PricingConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("[checkout]"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = std::env::temp_dir().join(format!("gloventra-config-{}", std::process::id()));
        let path = dir.join("nested").join("pricing.toml");

        let mut config = PricingConfig::default();
        config.currency.default = "INR".into();
        config.save(Some(path.clone())).unwrap();

        let loaded: PricingConfig =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.currency.default, "INR");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
