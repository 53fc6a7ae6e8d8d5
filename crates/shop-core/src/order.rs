//! # Checkout & Order Types
//!
//! Payment-session requests, provider sessions, webhook events and the
//! orders materialized from them.

use crate::cart::Cart;
use crate::product::{Currency, Price};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Metadata key carrying the cart code through the provider
pub const METADATA_CART_CODE: &str = "cart_code";

/// Metadata key carrying the encoded [`crate::CartSnapshot`]
pub const METADATA_CART_SNAPSHOT: &str = "cart_snapshot";

/// A line item in a payment-session request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product name (denormalized for display)
    pub name: String,

    /// Unit price
    pub unit_price: Price,

    /// Quantity
    pub quantity: u32,
}

impl LineItem {
    /// Calculate the total price for this line item
    pub fn total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Everything a provider needs to open a hosted payment session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub line_items: Vec<LineItem>,

    /// Currency (same for all items)
    pub currency: Currency,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,

    /// Payment method types enabled for the session (e.g. "card")
    pub payment_method_types: Vec<String>,

    pub success_url: String,
    pub cancel_url: String,

    /// Opaque key/value pairs echoed back in webhook events
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,

    /// Sent as `Idempotency-Key`; fresh per checkout attempt
    pub idempotency_key: String,
}

impl CheckoutRequest {
    /// Build a request with one line item per cart item
    pub fn from_cart(cart: &Cart, currency: Currency) -> Self {
        let line_items = cart
            .items
            .iter()
            .map(|item| LineItem {
                name: item.product.name.clone(),
                unit_price: Price::from_cents(item.product.price.amount, currency),
                quantity: item.quantity,
            })
            .collect();

        Self {
            line_items,
            currency,
            customer_email: None,
            payment_method_types: vec!["card".to_string()],
            success_url: String::new(),
            cancel_url: String::new(),
            metadata: HashMap::new(),
            idempotency_key: Uuid::new_v4().to_string(),
        }
    }

    /// Set customer email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.customer_email = Some(email.into());
        self
    }

    /// Set redirect URLs
    pub fn with_urls(mut self, success_url: impl Into<String>, cancel_url: impl Into<String>) -> Self {
        self.success_url = success_url.into();
        self.cancel_url = cancel_url.into();
        self
    }

    pub fn with_payment_methods(mut self, methods: Vec<String>) -> Self {
        self.payment_method_types = methods;
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Calculate request subtotal
    pub fn subtotal(&self) -> Price {
        let amount = self.line_items.iter().map(|item| item.total().amount).sum();
        Price::from_cents(amount, self.currency)
    }

    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }
}

/// A checkout session created by a payment provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider's session ID
    pub session_id: String,

    /// Provider name (e.g., "stripe")
    pub provider: String,

    /// URL to redirect customer to for payment
    pub checkout_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl CheckoutSession {
    pub fn new(
        session_id: impl Into<String>,
        provider: impl Into<String>,
        checkout_url: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            provider: provider.into(),
            checkout_url: checkout_url.into(),
            expires_at: None,
            created_at: Utc::now(),
        }
    }

    /// Expiry as a unix timestamp, when the provider reports one
    pub fn with_expires_at(mut self, unix_ts: Option<i64>) -> Self {
        self.expires_at = unix_ts.and_then(|ts| DateTime::from_timestamp(ts, 0));
        self
    }
}

/// Webhook event kinds the storefront distinguishes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventType {
    /// Checkout session completed (payment may still be pending)
    CheckoutCompleted,
    /// Delayed payment method settled
    AsyncPaymentSucceeded,
    /// Delayed payment method failed
    AsyncPaymentFailed,
    /// Session expired unpaid
    CheckoutExpired,
    /// Anything else (acknowledged, ignored)
    Unknown(String),
}

/// A verified, parsed webhook event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event ID from provider
    pub event_id: String,

    pub event_type: WebhookEventType,

    /// Provider name
    pub provider: String,

    /// Related session ID (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,

    /// Amount paid (in smallest unit)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_total: Option<i64>,

    /// Currency code as reported by the provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<String>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,

    /// Raw event object (for debugging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<serde_json::Value>,

    pub timestamp: DateTime<Utc>,
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(OrderStatus::Pending),
            "paid" => Some(OrderStatus::Paid),
            _ => None,
        }
    }
}

/// An order line, with the unit price paid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Price,
}

/// An order materialized from a paid checkout session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,

    /// Provider checkout session ID (unique)
    pub stripe_checkout_id: String,

    /// Provider-reported total
    pub amount: Price,

    pub customer_email: String,

    pub status: OrderStatus,

    #[serde(default)]
    pub items: Vec<OrderItem>,

    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Sum of the item snapshots, for reconciliation against `amount`
    pub fn items_total(&self) -> Price {
        let amount = self.items.iter().map(|i| i.unit_price.times(i.quantity).amount).sum();
        Price::from_cents(amount, self.amount.currency)
    }

    pub fn is_reconciled(&self) -> bool {
        self.items_total().amount == self.amount.amount
    }
}

/// Fields needed to insert an order
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub stripe_checkout_id: String,
    pub amount: Price,
    pub customer_email: String,
    pub status: OrderStatus,
}

/// Fields needed to insert an order line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub quantity: u32,
    pub unit_amount: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartItem;
    use crate::product::Product;

    fn product(id: i64, name: &str, price: f64) -> Product {
        Product {
            id,
            name: name.to_string(),
            slug: name.to_lowercase(),
            description: String::new(),
            price: Price::new(price, Currency::USD),
            image: None,
            featured: false,
            category_id: None,
        }
    }

    fn cart() -> Cart {
        Cart {
            id: 7,
            cart_code: "ABC123".to_string(),
            items: vec![
                CartItem {
                    id: 1,
                    product: product(1, "Mug", 10.0),
                    quantity: 2,
                },
                CartItem {
                    id: 2,
                    product: product(2, "Sticker", 5.0),
                    quantity: 1,
                },
            ],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_request_from_cart() {
        let request = CheckoutRequest::from_cart(&cart(), Currency::USD)
            .with_email("buyer@example.com")
            .with_metadata(METADATA_CART_CODE, "ABC123");

        assert_eq!(request.line_items.len(), 2);
        assert_eq!(request.line_items[0].unit_price.amount, 1000);
        assert_eq!(request.line_items[0].quantity, 2);
        assert_eq!(request.line_items[1].unit_price.amount, 500);
        assert_eq!(request.subtotal().amount, 2500);
        assert_eq!(request.subtotal().as_decimal(), 25.0);
        assert_eq!(request.metadata.get("cart_code").map(String::as_str), Some("ABC123"));
    }

    #[test]
    fn test_idempotency_key_is_fresh_per_request() {
        let a = CheckoutRequest::from_cart(&cart(), Currency::USD);
        let b = CheckoutRequest::from_cart(&cart(), Currency::USD);
        assert_ne!(a.idempotency_key, b.idempotency_key);
    }

    #[test]
    fn test_order_reconciliation() {
        let order = Order {
            id: 1,
            stripe_checkout_id: "cs_123".to_string(),
            amount: Price::from_cents(2500, Currency::USD),
            customer_email: "buyer@example.com".to_string(),
            status: OrderStatus::Paid,
            items: vec![
                OrderItem {
                    id: 1,
                    product_id: 1,
                    product_name: "Mug".to_string(),
                    quantity: 2,
                    unit_price: Price::from_cents(1000, Currency::USD),
                },
                OrderItem {
                    id: 2,
                    product_id: 2,
                    product_name: "Sticker".to_string(),
                    quantity: 1,
                    unit_price: Price::from_cents(500, Currency::USD),
                },
            ],
            created_at: Utc::now(),
        };

        assert!(order.is_reconciled());
        assert_eq!(order.amount.as_decimal(), 25.0);
    }

    #[test]
    fn test_order_status_strings() {
        assert_eq!(OrderStatus::Paid.as_str(), "paid");
        assert_eq!(OrderStatus::parse("Paid"), Some(OrderStatus::Paid));
        assert_eq!(OrderStatus::parse("refunded"), None);
    }
}
