//! # Payment Strategy Trait
//!
//! Strategy pattern trait for hosted-checkout payment providers.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PaymentStrategy (trait)                  │
//! │  ├── create_checkout()                                      │
//! │  ├── verify_webhook()                                       │
//! │  └── provider_name()                                        │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                    ┌───────┴───────┐
//!                    │StripeCheckout │
//!                    │   Strategy    │
//!                    └───────────────┘
//! ```
//!
//! Provider credentials are owned by each implementation and passed in at
//! construction time.

use crate::error::ShopResult;
use crate::order::{CheckoutRequest, CheckoutSession, WebhookEvent};
use async_trait::async_trait;
use std::sync::Arc;

/// Core trait for payment provider implementations.
#[async_trait]
pub trait PaymentStrategy: Send + Sync {
    /// Open a hosted payment session.
    ///
    /// # Returns
    /// A `CheckoutSession` carrying the provider session id and redirect URL.
    async fn create_checkout(&self, request: &CheckoutRequest) -> ShopResult<CheckoutSession>;

    /// Verify a webhook signature and parse the event.
    ///
    /// # Arguments
    /// * `payload` - Raw webhook body bytes, exactly as received
    /// * `signature` - Signature header from the request
    async fn verify_webhook(&self, payload: &[u8], signature: &str) -> ShopResult<WebhookEvent>;

    /// Get the provider name (for logging and health reporting).
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a boxed payment strategy (dynamic dispatch)
pub type BoxedPaymentStrategy = Arc<dyn PaymentStrategy>;

/// Configuration for URLs used in checkout
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    /// Base URL of the application (e.g., "https://shop.example.com")
    pub base_url: String,
    /// Success page path (e.g., "/checkout/success")
    pub success_path: String,
    /// Cancel page path (e.g., "/checkout/cancel")
    pub cancel_path: String,
}

impl CheckoutUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            success_path: "/checkout/success".to_string(),
            cancel_path: "/checkout/cancel".to_string(),
        }
    }

    pub fn success_url(&self) -> String {
        join_url(&self.base_url, &self.success_path)
    }

    pub fn cancel_url(&self) -> String {
        join_url(&self.base_url, &self.cancel_path)
    }

    /// Success URL with Stripe's `{CHECKOUT_SESSION_ID}` template appended
    pub fn success_url_with_session(&self) -> String {
        let url = self.success_url();
        if url.contains('?') {
            format!("{}&session_id={{CHECKOUT_SESSION_ID}}", url)
        } else {
            format!("{}?session_id={{CHECKOUT_SESSION_ID}}", url)
        }
    }
}

/// Absolute paths are taken as full URLs
fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!("{}{}", base, path)
    }
}

impl Default for CheckoutUrls {
    fn default() -> Self {
        Self::new("http://localhost:8080")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_urls() {
        let urls = CheckoutUrls::new("https://shop.example.com/");

        assert_eq!(urls.success_url(), "https://shop.example.com/checkout/success");
        assert_eq!(urls.cancel_url(), "https://shop.example.com/checkout/cancel");
    }

    #[test]
    fn test_success_url_with_session() {
        let urls = CheckoutUrls::new("https://shop.example.com");
        assert_eq!(
            urls.success_url_with_session(),
            "https://shop.example.com/checkout/success?session_id={CHECKOUT_SESSION_ID}"
        );

        let mut urls = CheckoutUrls::new("https://shop.example.com");
        urls.success_path = "https://front.example.com/success?ref=checkout".to_string();
        assert_eq!(
            urls.success_url_with_session(),
            "https://front.example.com/success?ref=checkout&session_id={CHECKOUT_SESSION_ID}"
        );
    }
}
