//! # shop-stripe
//!
//! Stripe payment strategy for storefront-rs.
//!
//! **StripeCheckoutStrategy** drives the Checkout Sessions API:
//! dynamic line items, customer email prefill, and metadata that comes
//! back on every webhook event for the session.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shop_stripe::StripeCheckoutStrategy;
//! use shop_core::PaymentStrategy;
//!
//! let strategy = StripeCheckoutStrategy::from_env()?;
//! let session = strategy.create_checkout(&request).await?;
//!
//! // Redirect user to session.checkout_url
//! ```
//!
//! ## Webhook Handling
//!
//! ```rust,ignore
//! use shop_stripe::{dispatch_webhook_event, CheckoutCompletedData, WebhookHandler};
//!
//! struct Fulfiller;
//!
//! impl WebhookHandler for Fulfiller {
//!     type Outcome = ();
//!
//!     fn on_checkout_completed(&self, data: CheckoutCompletedData) -> ShopResult<()> {
//!         println!("Cart {:?} paid!", data.cart_code());
//!         Ok(())
//!     }
//!
//!     fn on_ignored_event(&self, _event: &WebhookEvent) -> ShopResult<()> {
//!         Ok(())
//!     }
//! }
//!
//! let event = strategy.verify_webhook(payload, signature).await?;
//! dispatch_webhook_event(&Fulfiller, &event)?;
//! ```

pub mod checkout;
pub mod config;
pub mod webhook;

// Re-exports
pub use checkout::StripeCheckoutStrategy;
pub use config::StripeConfig;
pub use webhook::{
    dispatch_webhook_event, signature_header, CheckoutCompletedData, WebhookHandler,
    SIGNATURE_HEADER,
};
