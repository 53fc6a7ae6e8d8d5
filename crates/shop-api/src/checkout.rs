//! # Checkout Orchestrator
//!
//! Turns a stored cart into a hosted payment session. Nothing is written
//! locally; the order only appears once the provider reports payment.

use crate::state::AppState;
use serde::{Deserialize, Serialize};
use shop_core::{
    validate_cart_code, CheckoutRequest, ShopError, ShopResult, METADATA_CART_CODE,
    METADATA_CART_SNAPSHOT,
};
use tracing::{info, warn};

/// Body of `POST /api/checkout`
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub cart_code: String,
    #[serde(default)]
    pub email: String,
}

impl CheckoutForm {
    pub fn validate(&self) -> ShopResult<()> {
        validate_cart_code(&self.cart_code)?;

        let email = self.email.trim();
        if email.is_empty() {
            return Err(ShopError::Validation("email is required".to_string()));
        }
        if !email.contains('@') {
            return Err(ShopError::Validation("email is not valid".to_string()));
        }
        Ok(())
    }
}

/// Session handle returned to the client
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub session_id: String,
    /// Redirect the customer here
    pub checkout_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    /// Sum of line items, in major units
    pub amount_subtotal: f64,
    pub currency: String,
}

/// Build the payment request for the form's cart and open a session.
pub async fn create_checkout(state: &AppState, form: &CheckoutForm) -> ShopResult<CheckoutResponse> {
    form.validate()?;

    let cart_code = form.cart_code.trim();
    let cart = state.db.carts().get(cart_code)?;
    if cart.is_empty() {
        return Err(ShopError::Validation(format!("cart {} is empty", cart_code)));
    }

    let mut request = CheckoutRequest::from_cart(&cart, state.config.currency)
        .with_email(form.email.trim())
        .with_urls(state.success_url(), state.cancel_url())
        .with_payment_methods(state.config.payment_method_types.clone())
        .with_metadata(METADATA_CART_CODE, cart_code);

    match cart.snapshot().encode_for_metadata() {
        Some(snapshot) => {
            request = request.with_metadata(METADATA_CART_SNAPSHOT, snapshot);
        }
        None => warn!(
            "Cart {} is too large to snapshot; fulfillment will read the live cart",
            cart_code
        ),
    }

    let subtotal = request.subtotal();
    info!(
        "Creating checkout: cart={}, {} items, total={}",
        cart_code,
        request.line_items.len(),
        subtotal.display()
    );

    let session = state.strategy.create_checkout(&request).await?;

    info!(
        "Created checkout session {} via {}",
        session.session_id,
        state.strategy.provider_name()
    );

    Ok(CheckoutResponse {
        session_id: session.session_id,
        checkout_url: session.checkout_url,
        expires_at: session.expires_at.map(|t| t.to_rfc3339()),
        amount_subtotal: subtotal.as_decimal(),
        currency: subtotal.currency.as_str().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(cart_code: &str, email: &str) -> CheckoutForm {
        CheckoutForm {
            cart_code: cart_code.to_string(),
            email: email.to_string(),
        }
    }

    #[test]
    fn test_form_validation() {
        assert!(form("ABC123", "buyer@example.com").validate().is_ok());
        assert!(form("", "buyer@example.com").validate().is_err());
        assert!(form("ABC123", "").validate().is_err());
        assert!(form("ABC123", "buyer").validate().is_err());
        assert!(form("ABCDEFGHIJKL", "buyer@example.com").validate().is_err());
    }
}
