//! # shop-core
//!
//! Core types and traits for the storefront checkout engine.
//!
//! This crate provides:
//! - `PaymentStrategy` trait for implementing payment providers
//! - `Product`, `Category`, `Price` and `Currency` for the catalog
//! - `Cart` and `CartSnapshot` for the pre-purchase side
//! - `CheckoutRequest`, `CheckoutSession`, `WebhookEvent` and `Order` for checkout
//! - `ShopError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_core::{CheckoutRequest, Currency, PaymentStrategy};
//!
//! let request = CheckoutRequest::from_cart(&cart, Currency::USD)
//!     .with_email("buyer@example.com")
//!     .with_urls(urls.success_url_with_session(), urls.cancel_url())
//!     .with_metadata("cart_code", &cart.cart_code);
//!
//! let session = strategy.create_checkout(&request).await?;
//!
//! // Redirect user to session.checkout_url
//! ```

pub mod cart;
pub mod error;
pub mod order;
pub mod product;
pub mod review;
pub mod strategy;

// Re-exports for convenience
pub use cart::{
    validate_cart_code, validate_quantity, Cart, CartItem, CartSnapshot, SnapshotEntry,
    MAX_ITEM_QUANTITY,
};
pub use error::{ShopError, ShopResult};
pub use order::{
    CheckoutRequest, CheckoutSession, LineItem, NewOrder, NewOrderItem, Order, OrderItem, OrderStatus, WebhookEvent, WebhookEventType,
    METADATA_CART_CODE, METADATA_CART_SNAPSHOT,
};
pub use product::{slugify, CatalogSeed, Category, Currency, Price, Product, ProductRating};
pub use review::{rating_label, validate_rating, Review, User, WishlistEntry, WishlistToggle};
pub use strategy::{BoxedPaymentStrategy, CheckoutUrls, PaymentStrategy};
