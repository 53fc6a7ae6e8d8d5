//! Shared fixtures: an in-memory database, a mocked Stripe API and a
//! router wired to both.

#![allow(dead_code)]

use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestResponse, TestServer};
use chrono::Utc;
use serde_json::{json, Value};
use shop_api::{create_router, AppConfig, AppState};
use shop_core::Product;
use shop_db::{NewProduct, ShopDatabase};
use shop_stripe::{signature_header, StripeCheckoutStrategy, StripeConfig};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

pub struct TestApp {
    pub server: TestServer,
    pub db: ShopDatabase,
    pub stripe: MockServer,
}

pub async fn spawn_app() -> TestApp {
    let stripe = MockServer::start().await;
    let db = ShopDatabase::in_memory().unwrap();

    let stripe_config = StripeConfig::new("sk_test_abc", WEBHOOK_SECRET)
        .with_api_base_url(stripe.uri());
    let strategy = StripeCheckoutStrategy::new(stripe_config).unwrap();

    let config = AppConfig {
        base_url: "https://shop.example.com".to_string(),
        ..Default::default()
    };
    let state = AppState::new(config, db.clone(), Arc::new(strategy));
    let server = TestServer::new(create_router(state)).unwrap();

    TestApp { server, db, stripe }
}

pub fn create_product(db: &ShopDatabase, name: &str, price_cents: i64) -> Product {
    db.catalog()
        .create_product(&NewProduct {
            name: name.to_string(),
            description: format!("A fine {}", name.to_lowercase()),
            price: price_cents,
            featured: true,
            ..Default::default()
        })
        .unwrap()
}

/// Stripe answers session creation with `session_id`
pub async fn mount_checkout_session(stripe: &MockServer, session_id: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": session_id,
            "object": "checkout.session",
            "url": format!("https://checkout.stripe.com/c/pay/{}", session_id),
            "expires_at": Utc::now().timestamp() + 86_400
        })))
        .mount(stripe)
        .await;
}

/// Body of a `checkout.session.*` event
pub fn checkout_event(
    kind: &str,
    session_id: &str,
    amount_total: i64,
    payment_status: &str,
    metadata: Value,
) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": format!("evt_{}_{}", kind.replace('.', "_"), session_id),
        "object": "event",
        "type": kind,
        "created": Utc::now().timestamp(),
        "data": {
            "object": {
                "id": session_id,
                "object": "checkout.session",
                "amount_total": amount_total,
                "currency": "usd",
                "customer_details": { "email": "buyer@example.com" },
                "payment_status": payment_status,
                "metadata": metadata
            }
        }
    }))
    .unwrap()
}

pub async fn post_signed_webhook(server: &TestServer, payload: Vec<u8>) -> TestResponse {
    let header = signature_header(WEBHOOK_SECRET, Utc::now().timestamp(), &payload);
    post_webhook_with_signature(server, payload, &header).await
}

pub async fn post_webhook_with_signature(
    server: &TestServer,
    payload: Vec<u8>,
    signature: &str,
) -> TestResponse {
    server
        .post("/webhook/stripe")
        .add_header(
            HeaderName::from_static("stripe-signature"),
            HeaderValue::from_str(signature).unwrap(),
        )
        .bytes(payload.into())
        .await
}
