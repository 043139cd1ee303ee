//! # Currency Catalog
//!
//! Static reference data for the currencies the storefront can display,
//! plus the locale table used as the last-resort currency guess.
//!
//! ## Catalog
//! ```text
//! ┌──────┬────────┬───────────────────┬──────────┐
//! │ code │ symbol │ name              │ decimals │
//! ├──────┼────────┼───────────────────┼──────────┤
//! │ USD  │ $      │ US Dollar         │ 2        │
//! │ EUR  │ €      │ Euro              │ 2        │
//! │ GBP  │ £      │ British Pound     │ 2        │
//! │ JPY  │ ¥      │ Japanese Yen      │ 0        │
//! │ INR  │ ₹      │ Indian Rupee      │ 2        │
//! │ AUD  │ A$     │ Australian Dollar │ 2        │
//! │ CAD  │ C$     │ Canadian Dollar   │ 2        │
//! └──────┴────────┴───────────────────┴──────────┘
//! ```
//!
//! Unknown codes are never an error here: callers fall back to
//! [`Currency::fallback`] (`$`, 2 decimals).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

// =============================================================================
// Currency Code
// =============================================================================

/// A syntactically valid ISO-4217-style code: three ASCII letters, upper-cased.
///
/// A valid code is not necessarily in the catalog; see [`lookup`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parses and normalises a currency code.
    ///
    /// ## Example
    /// ```rust
    /// use gloventra_core::currency::CurrencyCode;
    ///
    /// assert_eq!(CurrencyCode::parse(" eur ").unwrap().as_str(), "EUR");
    /// assert!(CurrencyCode::parse("EURO").is_err());
    /// assert!(CurrencyCode::parse("").is_err());
    /// ```
    pub fn parse(code: &str) -> Result<Self, ValidationError> {
        let code = code.trim();

        if code.is_empty() {
            return Err(ValidationError::Required {
                field: "currency".to_string(),
            });
        }

        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidFormat {
                field: "currency".to_string(),
                reason: format!("'{code}' is not a three-letter currency code"),
            });
        }

        Ok(CurrencyCode(code.to_ascii_uppercase()))
    }

    /// The store's default currency.
    pub fn usd() -> Self {
        CurrencyCode(DEFAULT_CURRENCY.to_string())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the catalog entry, if this currency is supported.
    pub fn currency(&self) -> Option<&'static Currency> {
        lookup(&self.0)
    }

    /// Whether the catalog lists this currency.
    pub fn is_supported(&self) -> bool {
        self.currency().is_some()
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        CurrencyCode::usd()
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurrencyCode::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CurrencyCode::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Currency
// =============================================================================

/// Default currency for unknown codes and failed detection.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Immutable catalog record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Currency {
    pub code: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
    /// Fractional digits rendered when formatting.
    pub decimals: u8,
}

const FALLBACK: Currency = Currency {
    code: DEFAULT_CURRENCY,
    symbol: "$",
    name: "US Dollar",
    decimals: 2,
};

impl Currency {
    /// The record used for codes missing from the catalog: `$`, 2 decimals.
    pub fn fallback() -> &'static Currency {
        &FALLBACK
    }
}

static SUPPORTED_CURRENCIES: [Currency; 7] = [
    FALLBACK,
    Currency {
        code: "EUR",
        symbol: "€",
        name: "Euro",
        decimals: 2,
    },
    Currency {
        code: "GBP",
        symbol: "£",
        name: "British Pound",
        decimals: 2,
    },
    Currency {
        code: "JPY",
        symbol: "¥",
        name: "Japanese Yen",
        decimals: 0,
    },
    Currency {
        code: "INR",
        symbol: "₹",
        name: "Indian Rupee",
        decimals: 2,
    },
    Currency {
        code: "AUD",
        symbol: "A$",
        name: "Australian Dollar",
        decimals: 2,
    },
    Currency {
        code: "CAD",
        symbol: "C$",
        name: "Canadian Dollar",
        decimals: 2,
    },
];

/// Every supported currency, in display order.
pub fn list_supported() -> &'static [Currency] {
    &SUPPORTED_CURRENCIES
}

/// Finds a currency by code (case-insensitive, surrounding whitespace ignored).
///
/// ## Example
/// ```rust
/// use gloventra_core::currency::lookup;
///
/// assert_eq!(lookup("jpy").unwrap().decimals, 0);
/// assert!(lookup("XYZ").is_none());
/// ```
pub fn lookup(code: &str) -> Option<&'static Currency> {
    let code = code.trim();
    SUPPORTED_CURRENCIES
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(code))
}

/// Finds a currency or returns the `$`/2-decimal fallback.
pub fn lookup_or_default(code: &str) -> &'static Currency {
    lookup(code).unwrap_or(Currency::fallback())
}

// =============================================================================
// Locale Fallback
// =============================================================================

/// Exact locale tags with a known currency.
const LOCALE_CURRENCIES: &[(&str, &str)] = &[
    ("en-US", "USD"),
    ("en-GB", "GBP"),
    ("en-AU", "AUD"),
    ("en-CA", "CAD"),
    ("ja", "JPY"),
    ("ja-JP", "JPY"),
    ("hi", "INR"),
    ("hi-IN", "INR"),
];

/// Language prefixes that map to the Euro.
const EURO_ZONE_LANGUAGES: &[&str] = &["de", "fr", "es", "it", "nl", "pt", "el", "fi", "at", "be"];

/// Derives a currency from a locale/language tag.
///
/// ## Lookup Order
/// ```text
/// "en_gb" ──► normalise ("en-GB") ──► exact table?  ──► GBP
///                                       │ no
///                                       ▼
///                              language in Euro zone? ──► EUR
///                                       │ no
///                                       ▼
///                                      USD
/// ```
///
/// ## Example
/// ```rust
/// use gloventra_core::currency::currency_from_locale;
///
/// assert_eq!(currency_from_locale("en-US").as_str(), "USD");
/// assert_eq!(currency_from_locale("ja").as_str(), "JPY");
/// assert_eq!(currency_from_locale("de-AT").as_str(), "EUR");
/// assert_eq!(currency_from_locale("sv-SE").as_str(), "USD");
/// ```
pub fn currency_from_locale(locale: &str) -> CurrencyCode {
    let tag = locale.trim().replace('_', "-");

    if let Some((_, code)) = LOCALE_CURRENCIES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(&tag))
    {
        return CurrencyCode(code.to_string());
    }

    let language = tag.split('-').next().unwrap_or_default().to_ascii_lowercase();
    if EURO_ZONE_LANGUAGES.contains(&language.as_str()) {
        return CurrencyCode("EUR".to_string());
    }

    CurrencyCode::usd()
}

// =============================================================================
// Unit Tests
// =============================================================================
