//! # Validation Module
//!
//! Input validation for checkout forms and pricing configuration.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Storefront form                                              │
//! │  ├── Inline hints while typing                                         │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Shipping address rules (all violations at once)                   │
//! │  └── Quantity, price and tax-rate bounds                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Shipping-quote service                                       │
//! │  └── Rejects destinations it cannot serve                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use gloventra_core::validation::{validate_quantity, validate_shipping_address};
//! use gloventra_core::types::ShippingAddress;
//!
//! validate_quantity(5).unwrap();
//!
//! let errors = validate_shipping_address(&ShippingAddress::default());
//! assert!(!errors.is_empty());
//! ```

use crate::error::ValidationError;
use crate::types::ShippingAddress;
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_CENTS, MAX_SHIPPING_RATE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Rules
// =============================================================================

/// Length bounds plus an allowed character class for one text field.
struct TextRule {
    field: &'static str,
    min: usize,
    max: usize,
    allowed: Option<(fn(char) -> bool, &'static str)>,
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == ' ' || c == '\'' || c == '-'
}

fn is_postal_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == ' ' || c == '-'
}

fn is_phone_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '+' | ' ' | '(' | ')' | '-')
}

const FULL_NAME: TextRule = TextRule {
    field: "fullName",
    min: 2,
    max: 100,
    allowed: Some((
        is_name_char,
        "can only contain letters, spaces, hyphens, and apostrophes",
    )),
};

const ADDRESS_LINE1: TextRule = TextRule {
    field: "addressLine1",
    min: 5,
    max: 200,
    allowed: None,
};

const CITY: TextRule = TextRule {
    field: "city",
    min: 2,
    max: 100,
    allowed: Some((
        is_name_char,
        "can only contain letters, spaces, hyphens, and apostrophes",
    )),
};

const STATE: TextRule = TextRule {
    field: "state",
    min: 2,
    max: 100,
    allowed: None,
};

const POSTAL_CODE: TextRule = TextRule {
    field: "postalCode",
    min: 3,
    max: 20,
    allowed: Some((is_postal_char, "invalid postal code format")),
};

const COUNTRY: TextRule = TextRule {
    field: "country",
    min: 2,
    max: 100,
    allowed: None,
};

const PHONE: TextRule = TextRule {
    field: "phone",
    min: 10,
    max: 20,
    allowed: Some((is_phone_char, "invalid phone number format")),
};

const ADDRESS_LINE2_MAX: usize = 200;

impl TextRule {
    fn check(&self, value: &str) -> ValidationResult<()> {
        let value = value.trim();
        let len = value.chars().count();

        if len == 0 {
            return Err(ValidationError::Required {
                field: self.field.to_string(),
            });
        }

        if len < self.min {
            return Err(ValidationError::TooShort {
                field: self.field.to_string(),
                min: self.min,
            });
        }

        if len > self.max {
            return Err(ValidationError::TooLong {
                field: self.field.to_string(),
                max: self.max,
            });
        }

        if let Some((allowed, reason)) = self.allowed {
            if !value.chars().all(allowed) {
                return Err(ValidationError::InvalidFormat {
                    field: self.field.to_string(),
                    reason: reason.to_string(),
                });
            }
        }

        Ok(())
    }
}

// =============================================================================
// Address Validation
// =============================================================================

/// Validates a shipping address, returning every violation found.
///
/// ## Rules
/// ```text
/// ┌──────────────┬─────────┬──────────────────────────────────┐
/// │ field        │ length  │ characters                       │
/// ├──────────────┼─────────┼──────────────────────────────────┤
/// │ fullName     │ 2-100   │ letters, space, ' and -          │
/// │ addressLine1 │ 5-200   │ any                              │
/// │ addressLine2 │ 0-200   │ any (optional)                   │
/// │ city         │ 2-100   │ letters, space, ' and -          │
/// │ state        │ 2-100   │ any                              │
/// │ postalCode   │ 3-20    │ letters, digits, space and -     │
/// │ country      │ 2-100   │ any                              │
/// │ phone        │ 10-20   │ digits, +, space, ( ) and -      │
/// └──────────────┴─────────┴──────────────────────────────────┘
/// ```
///
/// An empty vector means the address is valid.
///
/// ## Example
/// ```rust
/// use gloventra_core::types::ShippingAddress;
/// use gloventra_core::validation::validate_shipping_address;
///
/// let address = ShippingAddress {
///     full_name: "Ada Lovelace".into(),
///     address_line1: "12 St James's Square".into(),
///     address_line2: None,
///     city: "London".into(),
///     state: "Greater London".into(),
///     postal_code: "SW1Y 4JH".into(),
///     country: "GB".into(),
///     phone: "+44 20 7946 0000".into(),
/// };
/// assert!(validate_shipping_address(&address).is_empty());
/// ```
pub fn validate_shipping_address(address: &ShippingAddress) -> Vec<ValidationError> {
    let checks = [
        FULL_NAME.check(&address.full_name),
        ADDRESS_LINE1.check(&address.address_line1),
        validate_address_line2(address.address_line2.as_deref()),
        CITY.check(&address.city),
        STATE.check(&address.state),
        POSTAL_CODE.check(&address.postal_code),
        COUNTRY.check(&address.country),
        PHONE.check(&address.phone),
    ];

    checks.into_iter().filter_map(Result::err).collect()
}

fn validate_address_line2(line: Option<&str>) -> ValidationResult<()> {
    match line {
        Some(line) if line.trim().chars().count() > ADDRESS_LINE2_MAX => {
            Err(ValidationError::TooLong {
                field: "addressLine2".to_string(),
                max: ADDRESS_LINE2_MAX,
            })
        }
        _ => Ok(()),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
/// - Must not exceed MAX_PRICE_CENTS
///
/// ## Example
/// ```rust
/// use gloventra_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a carrier's quoted rate (major units of its own currency).
///
/// ## Rules
/// - Must be a finite number
/// - Must be between 0 and MAX_SHIPPING_RATE
pub fn validate_shipping_rate(rate: f64) -> ValidationResult<()> {
    if !rate.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: "rate".to_string(),
            reason: "not a finite number".to_string(),
        });
    }

    if !(0.0..=MAX_SHIPPING_RATE).contains(&rate) {
        return Err(ValidationError::OutOfRange {
            field: "rate".to_string(),
            min: 0,
            max: MAX_SHIPPING_RATE as i64,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
