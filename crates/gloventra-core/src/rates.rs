//! # Exchange Rate Snapshot
//!
//! An immutable table of multipliers relative to one base currency.
//!
//! ## Lifecycle
//! ```text
//! rate provider ──► ExchangeRateSnapshot { base, rates, fetched_at }
//!                        │
//!                        ├── cached by the preference store
//!                        ├── fresh while now - fetched_at < TTL
//!                        └── replaced (never edited) by the next fetch
//! ```
//!
//! `rates[base]` is 1 by definition and may be absent from the table.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::currency::list_supported;

/// Default freshness window for cached snapshots (1 hour).
pub const DEFAULT_RATES_TTL_SECS: i64 = 3600;

/// Exchange rates for one base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRateSnapshot {
    /// Currency the multipliers are relative to.
    pub base: String,

    /// Code → units of that currency per one unit of `base`.
    pub rates: BTreeMap<String, f64>,

    /// When the snapshot was obtained from the provider.
    #[serde(default = "epoch")]
    pub fetched_at: DateTime<Utc>,
}

fn epoch() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(0).single().unwrap_or_default()
}

impl ExchangeRateSnapshot {
    /// Creates a snapshot, normalising codes to upper case.
    pub fn new(
        base: impl Into<String>,
        rates: impl IntoIterator<Item = (String, f64)>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        ExchangeRateSnapshot {
            base: base.into().trim().to_ascii_uppercase(),
            rates: rates
                .into_iter()
                .map(|(code, rate)| (code.trim().to_ascii_uppercase(), rate))
                .collect(),
            fetched_at,
        }
    }

    /// A snapshot mapping every supported currency to 1.
    ///
    /// Conversions through it are identity operations. Used when no live or
    /// cached rates exist so that conversion never fails outright.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::Utc;
    /// use gloventra_core::rates::ExchangeRateSnapshot;
    ///
    /// let snapshot = ExchangeRateSnapshot::identity("USD", Utc::now());
    /// assert!(snapshot.rates.values().all(|rate| *rate == 1.0));
    /// assert_eq!(snapshot.rates.len(), 7);
    /// ```
    pub fn identity(base: impl Into<String>, fetched_at: DateTime<Utc>) -> Self {
        ExchangeRateSnapshot::new(
            base,
            list_supported()
                .iter()
                .map(|currency| (currency.code.to_string(), 1.0)),
            fetched_at,
        )
    }

    /// Whether this snapshot is relative to `base`.
    pub fn is_for_base(&self, base: &str) -> bool {
        self.base.eq_ignore_ascii_case(base.trim())
    }

    /// Multiplier for `code`.
    ///
    /// Missing, zero, negative or non-finite entries read as 1 so that a bad
    /// table degrades to an identity conversion instead of an error.
    pub fn rate_for(&self, code: &str) -> f64 {
        if self.is_for_base(code) {
            return 1.0;
        }
        self.rates
            .get(&code.trim().to_ascii_uppercase())
            .copied()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .unwrap_or(1.0)
    }

    /// Whether the table has a usable entry for `code`.
    pub fn has_rate(&self, code: &str) -> bool {
        self.is_for_base(code)
            || self
                .rates
                .get(&code.trim().to_ascii_uppercase())
                .is_some_and(|rate| rate.is_finite() && *rate > 0.0)
    }

    /// Time elapsed since the snapshot was fetched.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.fetched_at
    }

    /// Fresh while `now - fetched_at < ttl`.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.age(now) < ttl
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(fetched_at: DateTime<Utc>) -> ExchangeRateSnapshot {
        ExchangeRateSnapshot::new(
            "usd",
            [("eur".to_string(), 0.92), ("JPY".to_string(), 150.0)],
            fetched_at,
        )
    }

    #[test]
    fn test_codes_are_normalised() {
        let snapshot = sample(Utc::now());
        assert_eq!(snapshot.base, "USD");
        assert!(snapshot.rates.contains_key("EUR"));
    }

    #[test]
    fn test_rate_for_defaults_to_one() {
        let mut snapshot = sample(Utc::now());
        snapshot.rates.insert("GBP".into(), 0.0);
        snapshot.rates.insert("INR".into(), f64::NAN);

        assert_eq!(snapshot.rate_for("EUR"), 0.92);
        assert_eq!(snapshot.rate_for("usd"), 1.0);
        assert_eq!(snapshot.rate_for("CAD"), 1.0);
        assert_eq!(snapshot.rate_for("GBP"), 1.0);
        assert_eq!(snapshot.rate_for("INR"), 1.0);
        assert!(snapshot.has_rate("jpy"));
        assert!(!snapshot.has_rate("GBP"));
    }

    #[test]
    fn test_freshness_boundary() {
        let t0 = Utc::now();
        let snapshot = sample(t0);
        let ttl = Duration::seconds(DEFAULT_RATES_TTL_SECS);

        assert!(snapshot.is_fresh(t0, ttl));
        assert!(snapshot.is_fresh(t0 + ttl - Duration::milliseconds(1), ttl));
        assert!(!snapshot.is_fresh(t0 + ttl, ttl));
        assert!(!snapshot.is_fresh(t0 + ttl + Duration::milliseconds(1), ttl));
    }

    #[test]
    fn test_wire_payload_without_timestamp() {
        let snapshot: ExchangeRateSnapshot =
            serde_json::from_str(r#"{"base":"USD","rates":{"EUR":0.9}}"#).unwrap();
        assert_eq!(snapshot.fetched_at.timestamp_millis(), 0);
        assert_eq!(snapshot.rate_for("EUR"), 0.9);
    }
}
