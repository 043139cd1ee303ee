//! # Preference Store
//!
//! Scoped persistence of the currency preference and the last rate snapshot.
//!
//! ## Stored Keys
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  gloventra_currency        "EUR"                                        │
//! │  gloventra_exchange_rates  {"base":"USD","rates":{"EUR":0.92,...}}      │
//! │  gloventra_rates_timestamp "1709294400000"   (epoch milliseconds)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The three keys are written independently. A snapshot without its
//! timestamp is never fresh, but it is still returned by
//! [`PreferenceStore::get_raw_cached_rates`].
//!
//! ## Failure Policy
//! Nothing here returns an error. Storage failures are logged at `warn!`
//! and read as "absent"; writes report success as a `bool`.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use gloventra_core::currency::CurrencyCode;
use gloventra_core::rates::ExchangeRateSnapshot;
use gloventra_store::KeyValueStore;

use crate::clock::Clock;

/// Key holding the selected currency code.
pub const CURRENCY_KEY: &str = "gloventra_currency";

/// Key holding the JSON rate snapshot.
pub const RATES_KEY: &str = "gloventra_exchange_rates";

/// Key holding when the snapshot was fetched, in epoch milliseconds.
pub const RATES_TIMESTAMP_KEY: &str = "gloventra_rates_timestamp";

/// Preference and rate cache over a [`KeyValueStore`].
#[derive(Clone)]
pub struct PreferenceStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
}

impl PreferenceStore {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        ttl: chrono::Duration,
    ) -> Self {
        PreferenceStore { store, clock, ttl }
    }

    /// Freshness window applied by [`get_cached_rates`](Self::get_cached_rates).
    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    /// Current time according to the injected clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // =========================================================================
    // Currency Preference
    // =========================================================================

    /// Returns the persisted currency.
    ///
    /// Values that fail to parse or are not in the catalog are ignored.
    pub async fn get_stored_currency(&self) -> Option<CurrencyCode> {
        let raw = self.read(CURRENCY_KEY).await?;

        match CurrencyCode::parse(&raw) {
            Ok(code) if code.is_supported() => Some(code),
            Ok(code) => {
                warn!(currency = %code, "Ignoring stored currency outside the catalog");
                None
            }
            Err(err) => {
                warn!(value = %raw, error = %err, "Ignoring malformed stored currency");
                None
            }
        }
    }

    /// Persists the currency. Returns false if the write was dropped.
    pub async fn store_currency(&self, code: &CurrencyCode) -> bool {
        self.write(CURRENCY_KEY, code.as_str()).await
    }

    // =========================================================================
    // Rate Cache
    // =========================================================================

    /// Returns the cached snapshot only while it is fresh.
    pub async fn get_cached_rates(&self) -> Option<ExchangeRateSnapshot> {
        let stamp = self.read(RATES_TIMESTAMP_KEY).await?;
        let fetched_at = match parse_timestamp(&stamp) {
            Some(at) => at,
            None => {
                warn!(value = %stamp, "Ignoring malformed rates timestamp");
                return None;
            }
        };

        let mut snapshot = self.read_snapshot().await?;
        snapshot.fetched_at = fetched_at;

        let now = self.clock.now();
        if snapshot.is_fresh(now, self.ttl) {
            Some(snapshot)
        } else {
            debug!(
                base = %snapshot.base,
                age_secs = snapshot.age(now).num_seconds(),
                "Cached rates are stale"
            );
            None
        }
    }

    /// Returns the cached snapshot regardless of age.
    ///
    /// Without a readable timestamp the snapshot is dated at the epoch.
    pub async fn get_raw_cached_rates(&self) -> Option<ExchangeRateSnapshot> {
        let mut snapshot = self.read_snapshot().await?;

        snapshot.fetched_at = self
            .read(RATES_TIMESTAMP_KEY)
            .await
            .and_then(|stamp| parse_timestamp(&stamp))
            .unwrap_or_else(epoch);

        Some(snapshot)
    }

    /// Overwrites the cached snapshot and its timestamp.
    ///
    /// Returns true only if both keys were written.
    pub async fn cache_rates(&self, snapshot: &ExchangeRateSnapshot) -> bool {
        let payload = match serde_json::to_string(snapshot) {
            Ok(json) => json,
            Err(err) => {
                warn!(error = %err, "Failed to serialize rate snapshot");
                return false;
            }
        };

        let rates_written = self.write(RATES_KEY, &payload).await;
        let stamp_written = self
            .write(
                RATES_TIMESTAMP_KEY,
                &snapshot.fetched_at.timestamp_millis().to_string(),
            )
            .await;

        rates_written && stamp_written
    }

    // =========================================================================
    // Storage Helpers
    // =========================================================================

    async fn read_snapshot(&self) -> Option<ExchangeRateSnapshot> {
        let raw = self.read(RATES_KEY).await?;
        match serde_json::from_str::<ExchangeRateSnapshot>(&raw) {
            Ok(snapshot) => Some(ExchangeRateSnapshot::new(
                snapshot.base,
                snapshot.rates,
                snapshot.fetched_at,
            )),
            Err(err) => {
                warn!(error = %err, "Ignoring unreadable cached rates");
                None
            }
        }
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(key = %key, error = %err, "Storage read failed, treating as absent");
                None
            }
        }
    }

    async fn write(&self, key: &str, value: &str) -> bool {
        match self.store.set(key, value).await {
            Ok(()) => true,
            Err(err) => {
                warn!(key = %key, error = %err, "Storage write failed, dropping it");
                false
            }
        }
    }
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::Duration;
    use gloventra_store::{Database, DbConfig, MemoryKvStore};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn setup() -> (Arc<MemoryKvStore>, Arc<ManualClock>, PreferenceStore) {
        let kv = Arc::new(MemoryKvStore::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let prefs = PreferenceStore::new(kv.clone(), clock.clone(), Duration::hours(1));
        (kv, clock, prefs)
    }

    fn snapshot(at: DateTime<Utc>) -> ExchangeRateSnapshot {
        ExchangeRateSnapshot::new(
            "USD",
            [("EUR".to_string(), 0.92), ("JPY".to_string(), 150.0)],
            at,
        )
    }

    #[tokio::test]
    async fn test_currency_round_trip() {
        let (_, _, prefs) = setup();
        assert_eq!(prefs.get_stored_currency().await, None);

        let eur = CurrencyCode::parse("EUR").unwrap();
        assert!(prefs.store_currency(&eur).await);
        assert_eq!(prefs.get_stored_currency().await, Some(eur));
    }

    #[tokio::test]
    async fn test_invalid_stored_currency_is_absent() {
        let (kv, _, prefs) = setup();

        kv.set(CURRENCY_KEY, "CHF").await.unwrap();
        assert_eq!(prefs.get_stored_currency().await, None);

        kv.set(CURRENCY_KEY, "euro").await.unwrap();
        assert_eq!(prefs.get_stored_currency().await, None);

        kv.set(CURRENCY_KEY, " gbp ").await.unwrap();
        assert_eq!(
            prefs.get_stored_currency().await.map(|c| c.to_string()),
            Some("GBP".to_string())
        );
    }

    #[tokio::test]
    async fn test_storage_failure_reads_absent_and_drops_writes() {
        let (kv, _, prefs) = setup();
        let eur = CurrencyCode::parse("EUR").unwrap();
        prefs.store_currency(&eur).await;
        prefs.cache_rates(&snapshot(t0())).await;

        kv.set_failing(true);
        assert_eq!(prefs.get_stored_currency().await, None);
        assert_eq!(prefs.get_cached_rates().await, None);
        assert_eq!(prefs.get_raw_cached_rates().await, None);
        assert!(!prefs.store_currency(&CurrencyCode::usd()).await);
        assert!(!prefs.cache_rates(&snapshot(t0())).await);

        kv.set_failing(false);
        assert_eq!(prefs.get_stored_currency().await, Some(eur));
    }

    #[tokio::test]
    async fn test_cache_freshness_boundary() {
        let (_, clock, prefs) = setup();
        assert!(prefs.cache_rates(&snapshot(t0())).await);

        clock.set(t0() + Duration::hours(1) - Duration::milliseconds(1));
        let cached = prefs.get_cached_rates().await.unwrap();
        assert_eq!(cached.fetched_at, t0());
        assert_eq!(cached.rate_for("JPY"), 150.0);

        clock.set(t0() + Duration::hours(1));
        assert_eq!(prefs.get_cached_rates().await, None);

        clock.set(t0() + Duration::hours(1) + Duration::milliseconds(1));
        assert_eq!(prefs.get_cached_rates().await, None);
        assert_eq!(prefs.get_raw_cached_rates().await, Some(snapshot(t0())));
    }

    #[tokio::test]
    async fn test_snapshot_without_timestamp() {
        let (kv, _, prefs) = setup();
        kv.set(RATES_KEY, r#"{"base":"usd","rates":{"eur":0.9}}"#)
            .await
            .unwrap();

        assert_eq!(prefs.get_cached_rates().await, None);

        let raw = prefs.get_raw_cached_rates().await.unwrap();
        assert_eq!(raw.base, "USD");
        assert_eq!(raw.rate_for("EUR"), 0.9);
        assert_eq!(raw.fetched_at, epoch());
    }

    #[tokio::test]
    async fn test_corrupt_entries_are_absent() {
        let (kv, _, prefs) = setup();
        kv.set(RATES_KEY, "{not json").await.unwrap();
        kv.set(RATES_TIMESTAMP_KEY, "1709294400000").await.unwrap();
        assert_eq!(prefs.get_raw_cached_rates().await, None);

        prefs.cache_rates(&snapshot(t0())).await;
        kv.set(RATES_TIMESTAMP_KEY, "yesterday").await.unwrap();
        assert_eq!(prefs.get_cached_rates().await, None);
        assert_eq!(prefs.get_raw_cached_rates().await.unwrap().fetched_at, epoch());
    }

    #[tokio::test]
    async fn test_cache_rates_overwrites() {
        let (kv, clock, prefs) = setup();
        prefs.cache_rates(&snapshot(t0())).await;

        clock.advance(Duration::minutes(90));
        let newer = ExchangeRateSnapshot::new("USD", [("EUR".to_string(), 0.95)], clock.now());
        assert!(prefs.cache_rates(&newer).await);

        assert_eq!(prefs.get_cached_rates().await, Some(newer.clone()));
        assert_eq!(
            kv.get(RATES_TIMESTAMP_KEY).await.unwrap(),
            Some(newer.fetched_at.timestamp_millis().to_string())
        );
    }

    #[tokio::test]
    async fn test_sqlite_backed_preferences() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let clock = Arc::new(ManualClock::new(t0()));
        let prefs = PreferenceStore::new(Arc::new(db.kv()), clock, Duration::hours(1));

        let jpy = CurrencyCode::parse("JPY").unwrap();
        assert!(prefs.store_currency(&jpy).await);
        assert!(prefs.cache_rates(&snapshot(t0())).await);

        assert_eq!(prefs.get_stored_currency().await, Some(jpy));
        assert_eq!(prefs.get_cached_rates().await, Some(snapshot(t0())));
    }
}
