//! # Shop Error Types
//!
//! Typed error handling for the storefront.
//! Every fallible operation returns `Result<T, ShopError>`.

use thiserror::Error;

/// Core error type for storefront operations
#[derive(Debug, Error)]
pub enum ShopError {
    /// Referenced record is absent (cart, product, order, review, user)
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Malformed or missing request fields
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Webhook signature verification failed
    #[error("Webhook verification failed: {0}")]
    WebhookVerificationFailed(String),

    /// Webhook payload parsing error
    #[error("Webhook parse error: {0}")]
    WebhookParseError(String),

    /// Payment provider rejected the call
    #[error("Provider error [{provider}]: {message}")]
    ProviderError { provider: String, message: String },

    /// Network/HTTP error communicating with provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Uniqueness conflict (duplicate review, duplicate fulfillment)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Database failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ShopError {
    /// Shorthand for a `NotFound` error
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        ShopError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Returns true if the payment provider may succeed on a later attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ShopError::NetworkError(_) | ShopError::ProviderError { .. } | ShopError::Storage(_)
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ShopError::NotFound { .. } => 404,
            ShopError::Validation(_) => 400,
            ShopError::WebhookVerificationFailed(_) => 400,
            ShopError::WebhookParseError(_) => 400,
            ShopError::ProviderError { .. } => 502,
            ShopError::NetworkError(_) => 503,
            ShopError::Conflict(_) => 409,
            ShopError::Configuration(_) => 500,
            ShopError::Storage(_) => 500,
            ShopError::Serialization(_) => 500,
        }
    }
}

/// Result type alias for storefront operations
pub type ShopResult<T> = Result<T, ShopError>;
