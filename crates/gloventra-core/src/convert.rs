//! # Conversion Engine
//!
//! Converts amounts between currencies through a snapshot's base and renders
//! them with the target currency's symbol and precision.
//!
//! ## Conversion Path
//! ```text
//! amount (from) ──► ÷ rates[from] ──► base amount ──► × rates[to] ──► amount (to)
//!                   skipped when                      skipped when
//!                   from == base                      to == base
//!
//! from == to short-circuits: the input comes back bit-for-bit.
//! ```
//!
//! ## Formatting
//! ```text
//! format_price(1234.5, "USD") ──► "$1234.50"   two decimals, no grouping
//! format_price(1234.6, "JPY") ──► "¥1,235"     zero decimals, comma grouping
//! format_price(9.999, "XYZ")  ──► "$10.00"     unknown code: $ and 2 decimals
//! ```
//!
//! Nothing here can fail. Missing rates act as 1 and unknown currencies use
//! the fallback catalog record.

use crate::currency::lookup_or_default;
use crate::rates::ExchangeRateSnapshot;

/// Converts `amount` from one currency to another.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use gloventra_core::convert::convert;
/// use gloventra_core::rates::ExchangeRateSnapshot;
///
/// let snapshot = ExchangeRateSnapshot::new(
///     "USD",
///     [("EUR".to_string(), 0.5), ("GBP".to_string(), 0.25)],
///     Utc::now(),
/// );
/// assert_eq!(convert(10.0, "USD", "EUR", &snapshot), 5.0);
/// assert_eq!(convert(10.0, "EUR", "GBP", &snapshot), 5.0);
/// assert_eq!(convert(10.0, "EUR", "USD", &snapshot), 20.0);
/// ```
pub fn convert(amount: f64, from: &str, to: &str, snapshot: &ExchangeRateSnapshot) -> f64 {
    if from.trim().eq_ignore_ascii_case(to.trim()) {
        return amount;
    }

    let base_amount = if snapshot.is_for_base(from) {
        amount
    } else {
        amount / snapshot.rate_for(from)
    };

    if snapshot.is_for_base(to) {
        base_amount
    } else {
        base_amount * snapshot.rate_for(to)
    }
}

/// Renders `amount` in `code`'s symbol and precision.
///
/// ## Rules
/// - Rounds half away from zero at the currency's precision
/// - Zero-decimal currencies get comma thousands grouping
/// - Negative values render as symbol, then sign (`$-5.00`)
/// - Non-finite amounts render as zero
pub fn format_price(amount: f64, code: &str) -> String {
    let currency = lookup_or_default(code);
    let amount = if amount.is_finite() { amount } else { 0.0 };

    let body = if currency.decimals == 0 {
        // `+ 0.0` folds -0.0 into 0.0
        group_thousands(&format!("{:.0}", amount.round() + 0.0))
    } else {
        let decimals = i32::from(currency.decimals);
        let scale = 10f64.powi(decimals);
        let rounded = (amount * scale).round() / scale + 0.0;
        format!("{:.*}", currency.decimals as usize, rounded)
    };

    format!("{}{}", currency.symbol, body)
}

/// Converts, then formats in the target currency.
///
/// Without a snapshot (rates not loaded yet) the amount is rendered
/// unconverted in its source currency.
///
/// ## Example
/// ```rust
/// use gloventra_core::convert::convert_and_format;
///
/// assert_eq!(convert_and_format(12.0, "USD", "EUR", None), "$12.00");
/// ```
pub fn convert_and_format(
    amount: f64,
    from: &str,
    to: &str,
    snapshot: Option<&ExchangeRateSnapshot>,
) -> String {
    match snapshot {
        Some(snapshot) => format_price(convert(amount, from, to, snapshot), to),
        None => format_price(amount, from),
    }
}

/// Inserts `,` every three digits of the integer part.
fn group_thousands(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{sign}{grouped}")
}

// =============================================================================
// Unit Tests
// =============================================================================
