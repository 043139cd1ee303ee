//! # Error Types
//!
//! Domain-specific error types for gloventra-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  gloventra-core errors (this file)                                     │
//! │  ├── CoreError        - Pricing rule violations                        │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  gloventra-store errors (separate crate)                               │
//! │  └── StoreError       - Key-value store failures                       │
//! │                                                                         │
//! │  gloventra-pricing errors (separate crate)                             │
//! │  └── PricingError     - Network, config and collaborator failures      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → PricingError → fallback value     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Conversion and formatting never return these: unknown currencies and
//! missing rates degrade to documented defaults instead.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Pricing rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A shipping option id does not match any quoted option.
    ///
    /// ## When This Occurs
    /// - The UI kept a selection across a destination change
    /// - Quotes were cleared after a quote-service failure
    #[error("Shipping option not found: {0}")]
    ShippingOptionNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Address validation collects every one of them instead of stopping early.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., a malformed currency code or postal code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
