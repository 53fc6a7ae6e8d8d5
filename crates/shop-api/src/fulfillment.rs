//! # Fulfillment
//!
//! Reacts to verified checkout events by converting the checkout's cart
//! into a paid order. Redelivered events for the same session are no-ops.

use shop_core::{
    CartSnapshot, Currency, NewOrder, Order, OrderStatus, Price, ShopError, ShopResult,
    WebhookEvent,
};
use shop_db::{Fulfillment, ShopDatabase};
use shop_stripe::{CheckoutCompletedData, WebhookHandler};
use tracing::{info, warn};

/// What a webhook delivery did
#[derive(Debug, Clone, PartialEq)]
pub enum FulfillmentOutcome {
    /// A new order was created
    Fulfilled(Order),
    /// An order for this session already exists
    AlreadyFulfilled,
    /// The session carries no cart code
    Skipped,
    /// The referenced cart does not exist
    CartMissing,
    /// Checkout completed but the payment has not settled yet
    Pending,
    /// Event kind that never drives fulfillment
    Ignored(String),
}

impl FulfillmentOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            FulfillmentOutcome::Fulfilled(_) => "fulfilled",
            FulfillmentOutcome::AlreadyFulfilled => "already_fulfilled",
            FulfillmentOutcome::Skipped => "skipped",
            FulfillmentOutcome::CartMissing => "cart_missing",
            FulfillmentOutcome::Pending => "pending",
            FulfillmentOutcome::Ignored(_) => "ignored",
        }
    }
}

pub struct FulfillmentHandler<'a> {
    db: &'a ShopDatabase,
}

impl<'a> FulfillmentHandler<'a> {
    pub fn new(db: &'a ShopDatabase) -> Self {
        Self { db }
    }

    fn fulfill(&self, data: CheckoutCompletedData) -> ShopResult<FulfillmentOutcome> {
        if self.db.orders().exists(&data.session_id)? {
            info!("Checkout {} already fulfilled", data.session_id);
            return Ok(FulfillmentOutcome::AlreadyFulfilled);
        }

        let Some(cart_code) = data.cart_code() else {
            warn!("Checkout {} has no cart_code metadata", data.session_id);
            return Ok(FulfillmentOutcome::Skipped);
        };

        // Orders record the currency Stripe charged in, never a substitute
        let currency = Currency::from_code(&data.currency).ok_or_else(|| {
            warn!(
                "Checkout {} paid in unsupported currency {:?}",
                data.session_id, data.currency
            );
            ShopError::WebhookParseError(format!(
                "unsupported currency {:?} on checkout {}",
                data.currency, data.session_id
            ))
        })?;

        let snapshot = match data.cart_snapshot().map(CartSnapshot::decode) {
            Some(Ok(snapshot)) => Some(snapshot),
            Some(Err(e)) => {
                warn!("Ignoring cart snapshot on {}: {}", data.session_id, e);
                None
            }
            None => None,
        };

        let order = NewOrder {
            stripe_checkout_id: data.session_id.clone(),
            amount: Price::from_cents(data.amount_total, currency),
            customer_email: data.customer_email.clone(),
            status: OrderStatus::Paid,
        };

        let outcome = match self.db.orders().fulfill(&order, cart_code, snapshot.as_ref())? {
            Fulfillment::Created(order) => FulfillmentOutcome::Fulfilled(order),
            Fulfillment::AlreadyExists => FulfillmentOutcome::AlreadyFulfilled,
            Fulfillment::CartMissing => {
                warn!(
                    "Cart {} for checkout {} no longer exists",
                    cart_code, data.session_id
                );
                FulfillmentOutcome::CartMissing
            }
        };

        Ok(outcome)
    }
}

impl WebhookHandler for FulfillmentHandler<'_> {
    type Outcome = FulfillmentOutcome;

    fn on_checkout_completed(&self, data: CheckoutCompletedData) -> ShopResult<Self::Outcome> {
        if !data.is_paid() {
            info!(
                "Checkout {} completed with payment_status={}, waiting for settlement",
                data.session_id, data.payment_status
            );
            return Ok(FulfillmentOutcome::Pending);
        }
        self.fulfill(data)
    }

    fn on_async_payment_succeeded(&self, data: CheckoutCompletedData) -> ShopResult<Self::Outcome> {
        self.fulfill(data)
    }

    fn on_ignored_event(&self, event: &WebhookEvent) -> ShopResult<Self::Outcome> {
        info!("Ignoring webhook {} ({:?})", event.event_id, event.event_type);
        Ok(FulfillmentOutcome::Ignored(event.event_id.clone()))
    }
}
