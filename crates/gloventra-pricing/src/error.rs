//! # Pricing Error Types
//!
//! Error types for the async pricing layer.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Pricing Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Payload             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Connection     │  │  InvalidResponse        │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  DeserializationFailed  │ │
//! │  │  ConfigLoad/Save│  │  HttpStatus     │  │  UnsupportedCurrency    │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │     Store       │  │      Core       │                              │
//! │  │  StoreError     │  │  CoreError      │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! These errors stay inside the crate's async boundaries. Public resolution
//! and rate operations return outcome enums carrying a fallback value instead.

use std::time::Duration;
use thiserror::Error;

use gloventra_core::{CoreError, ValidationError};
use gloventra_store::StoreError;

/// Result type alias for pricing operations.
pub type PricingResult<T> = Result<T, PricingError>;

/// Pricing error type covering configuration, network and storage failures.
#[derive(Debug, Error)]
pub enum PricingError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid pricing configuration.
    #[error("Invalid pricing configuration: {0}")]
    InvalidConfig(String),

    /// Invalid API base URL.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Request could not be sent or the connection dropped.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// No answer within the configured bound.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Service answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    // =========================================================================
    // Payload Errors
    // =========================================================================
    /// Response parsed but violates the service contract.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Failed to deserialize a payload.
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Failed to serialize a payload.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Currency is well-formed but not in the catalog.
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// Key-value store failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Pricing rule violation.
    #[error(transparent)]
    Core(#[from] CoreError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<ValidationError> for PricingError {
    fn from(err: ValidationError) -> Self {
        PricingError::Core(CoreError::Validation(err))
    }
}

impl From<serde_json::Error> for PricingError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            PricingError::SerializationFailed(err.to_string())
        } else {
            PricingError::DeserializationFailed(err.to_string())
        }
    }
}

impl From<url::ParseError> for PricingError {
    fn from(err: url::ParseError) -> Self {
        PricingError::InvalidUrl(err.to_string())
    }
}

/// Convert reqwest errors to PricingError.
///
/// ## Error Mapping
/// ```text
/// status error   → PricingError::HttpStatus
/// decode error   → PricingError::DeserializationFailed
/// builder error  → PricingError::InvalidConfig
/// anything else  → PricingError::ConnectionFailed
/// ```
impl From<reqwest::Error> for PricingError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return PricingError::HttpStatus {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            };
        }

        if err.is_decode() {
            PricingError::DeserializationFailed(err.to_string())
        } else if err.is_builder() {
            PricingError::InvalidConfig(err.to_string())
        } else {
            PricingError::ConnectionFailed(err.to_string())
        }
    }
}

impl From<std::io::Error> for PricingError {
    fn from(err: std::io::Error) -> Self {
        PricingError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for PricingError {
    fn from(err: toml::de::Error) -> Self {
        PricingError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for PricingError {
    fn from(err: toml::ser::Error) -> Self {
        PricingError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl PricingError {
    /// Returns true if a later attempt at the same call might succeed.
    ///
    /// ## Retryable Errors
    /// - Connection failures and timeouts
    /// - 5xx and 429 responses
    /// - Transient store failures
    pub fn is_retryable(&self) -> bool {
        match self {
            PricingError::ConnectionFailed(_) | PricingError::Timeout(_) => true,
            PricingError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            PricingError::Store(err) => err.is_transient(),
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            PricingError::InvalidConfig(_)
                | PricingError::InvalidUrl(_)
                | PricingError::ConfigLoadFailed(_)
                | PricingError::ConfigSaveFailed(_)
        )
    }
}
