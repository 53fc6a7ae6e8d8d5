//! # Stripe Webhook Handling
//!
//! Signature verification, event parsing and dispatch for Stripe webhooks.
//!
//! Stripe signs `"{timestamp}.{raw body}"` with HMAC-SHA256 using the
//! endpoint secret and sends `Stripe-Signature: t=<unix>,v1=<hex>[,v1=...]`.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use shop_core::{ShopError, ShopResult, WebhookEvent, WebhookEventType};
use std::collections::HashMap;
use subtle::ConstantTimeEq;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Name of the header carrying the signature
pub const SIGNATURE_HEADER: &str = "stripe-signature";

// =============================================================================
// Signature Verification
// =============================================================================

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_signature_header(header: &str) -> ShopResult<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse().ok(),
            "v1" => signatures.push(value.to_string()),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        ShopError::WebhookVerificationFailed("Missing timestamp in signature".to_string())
    })?;

    if signatures.is_empty() {
        return Err(ShopError::WebhookVerificationFailed(
            "No v1 signature found".to_string(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Build a `Stripe-Signature` header value for `payload`.
///
/// Used to exercise webhook endpoints locally and in tests.
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    format!("t={},v1={}", timestamp, compute_signature(secret, timestamp, payload))
}

/// Check `header` against the exact `payload` bytes.
///
/// Fails closed: a missing timestamp, a stale timestamp or a mismatched
/// signature are all errors.
pub fn verify_signature(
    secret: &str,
    payload: &[u8],
    header: &str,
    tolerance_secs: i64,
    now: i64,
) -> ShopResult<()> {
    let parsed = parse_signature_header(header)?;

    if (now - parsed.timestamp).abs() > tolerance_secs {
        return Err(ShopError::WebhookVerificationFailed(
            "Timestamp outside tolerance".to_string(),
        ));
    }

    let expected = compute_signature(secret, parsed.timestamp, payload);
    let valid = parsed
        .signatures
        .iter()
        .any(|sig| bool::from(sig.as_bytes().ct_eq(expected.as_bytes())));

    if !valid {
        return Err(ShopError::WebhookVerificationFailed(
            "Signature mismatch".to_string(),
        ));
    }

    Ok(())
}

// =============================================================================
// Event Parsing
// =============================================================================

#[derive(Debug, Deserialize)]
struct StripeWebhookEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    created: i64,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Map<String, serde_json::Value>,
}

fn event_type_from_str(kind: &str) -> WebhookEventType {
    match kind {
        "checkout.session.completed" => WebhookEventType::CheckoutCompleted,
        "checkout.session.async_payment_succeeded" => WebhookEventType::AsyncPaymentSucceeded,
        "checkout.session.async_payment_failed" => WebhookEventType::AsyncPaymentFailed,
        "checkout.session.expired" => WebhookEventType::CheckoutExpired,
        other => WebhookEventType::Unknown(other.to_string()),
    }
}

fn str_field(obj: &serde_json::Map<String, serde_json::Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(|v| v.as_str()).map(String::from)
}

/// Parse a (verified) Stripe event body into a [`WebhookEvent`]
pub fn parse_event(payload: &[u8]) -> ShopResult<WebhookEvent> {
    let event: StripeWebhookEvent = serde_json::from_slice(payload).map_err(|e| {
        ShopError::WebhookParseError(format!("Failed to parse webhook: {}", e))
    })?;

    debug!("Parsed Stripe webhook: type={}", event.event_type);

    let obj = event.data.object;

    let customer_email = str_field(&obj, "customer_email").or_else(|| {
        obj.get("customer_details")
            .and_then(|cd| cd.get("email"))
            .and_then(|v| v.as_str())
            .map(String::from)
    });

    let metadata: HashMap<String, String> = obj
        .get("metadata")
        .and_then(|m| m.as_object())
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();

    Ok(WebhookEvent {
        event_id: event.id,
        event_type: event_type_from_str(&event.event_type),
        provider: "stripe".to_string(),
        session_id: str_field(&obj, "id"),
        customer_email,
        amount_total: obj.get("amount_total").and_then(|v| v.as_i64()),
        currency: str_field(&obj, "currency"),
        payment_status: str_field(&obj, "payment_status"),
        metadata,
        timestamp: DateTime::from_timestamp(event.created, 0).unwrap_or_else(Utc::now),
        raw_data: Some(serde_json::Value::Object(obj)),
    })
}

// =============================================================================
// Dispatch
// =============================================================================

/// Fields of a paid checkout session needed to fulfill it
#[derive(Debug, Clone)]
pub struct CheckoutCompletedData {
    pub session_id: String,
    pub customer_email: String,
    pub amount_total: i64,
    pub currency: String,
    pub payment_status: String,
    pub metadata: HashMap<String, String>,
}

impl CheckoutCompletedData {
    /// Pull the required fields out of a webhook event
    pub fn from_event(event: &WebhookEvent) -> ShopResult<Self> {
        let session_id = event
            .session_id
            .clone()
            .ok_or_else(|| ShopError::WebhookParseError("Missing session id".to_string()))?;

        let amount_total = event
            .amount_total
            .ok_or_else(|| ShopError::WebhookParseError("Missing amount_total".to_string()))?;

        let currency = event
            .currency
            .clone()
            .ok_or_else(|| ShopError::WebhookParseError("Missing currency".to_string()))?;

        Ok(Self {
            session_id,
            customer_email: event.customer_email.clone().unwrap_or_default(),
            amount_total,
            currency: currency.to_lowercase(),
            payment_status: event
                .payment_status
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
            metadata: event.metadata.clone(),
        })
    }

    /// Check if payment was captured
    pub fn is_paid(&self) -> bool {
        matches!(self.payment_status.as_str(), "paid" | "no_payment_required")
    }

    /// Cart code recorded at checkout
    pub fn cart_code(&self) -> Option<&str> {
        self.metadata
            .get(shop_core::METADATA_CART_CODE)
            .map(|s| s.as_str())
    }

    /// Encoded cart snapshot recorded at checkout
    pub fn cart_snapshot(&self) -> Option<&str> {
        self.metadata
            .get(shop_core::METADATA_CART_SNAPSHOT)
            .map(|s| s.as_str())
    }
}

/// Webhook event handler trait
///
/// Implement this trait to react to checkout events.
pub trait WebhookHandler: Send + Sync {
    type Outcome;

    /// Called when a checkout session completes
    fn on_checkout_completed(&self, data: CheckoutCompletedData) -> ShopResult<Self::Outcome>;

    /// Called when a delayed payment settles. Same treatment as a completed
    /// checkout unless overridden.
    fn on_async_payment_succeeded(&self, data: CheckoutCompletedData) -> ShopResult<Self::Outcome> {
        self.on_checkout_completed(data)
    }

    /// Called for every other event kind
    fn on_ignored_event(&self, event: &WebhookEvent) -> ShopResult<Self::Outcome>;
}

/// Dispatch a webhook event to the appropriate handler method
pub fn dispatch_webhook_event<H: WebhookHandler + ?Sized>(
    handler: &H,
    event: &WebhookEvent,
) -> ShopResult<H::Outcome> {
    match &event.event_type {
        WebhookEventType::CheckoutCompleted => {
            let data = CheckoutCompletedData::from_event(event)?;
            handler.on_checkout_completed(data)
        }
        WebhookEventType::AsyncPaymentSucceeded => {
            let data = CheckoutCompletedData::from_event(event)?;
            handler.on_async_payment_succeeded(data)
        }
        WebhookEventType::AsyncPaymentFailed
        | WebhookEventType::CheckoutExpired
        | WebhookEventType::Unknown(_) => handler.on_ignored_event(event),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SECRET: &str = "whsec_test";

    fn checkout_payload(kind: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "id": "evt_test",
            "type": kind,
            "created": 1_700_000_000,
            "data": {
                "object": {
                    "id": "cs_test_123",
                    "object": "checkout.session",
                    "amount_total": 2500,
                    "currency": "usd",
                    "customer_email": null,
                    "customer_details": { "email": "buyer@example.com" },
                    "payment_status": "paid",
                    "metadata": { "cart_code": "ABC123", "cart_snapshot": "1:2:1000;2:1:500" }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_signature_header() {
        let parsed = parse_signature_header("t=1234567890,v1=abc123,v1=def456,v0=old").unwrap();

        assert_eq!(parsed.timestamp, 1234567890);
        assert_eq!(parsed.signatures, vec!["abc123", "def456"]);
        assert!(parse_signature_header("v1=abc").is_err());
        assert!(parse_signature_header("t=123").is_err());
    }

    #[test]
    fn test_signature_roundtrip() {
        let payload = checkout_payload("checkout.session.completed");
        let now = 1_700_000_100;
        let header = signature_header(SECRET, now, &payload);

        assert!(verify_signature(SECRET, &payload, &header, 300, now).is_ok());
        assert!(verify_signature("whsec_other", &payload, &header, 300, now).is_err());
    }

    #[test]
    fn test_signature_covers_exact_bytes() {
        let payload = checkout_payload("checkout.session.completed");
        let header = signature_header(SECRET, 100, &payload);

        let mut tampered = payload.clone();
        tampered.push(b' ');
        let err = verify_signature(SECRET, &tampered, &header, 300, 100).unwrap_err();
        assert!(matches!(err, ShopError::WebhookVerificationFailed(_)));
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let payload = b"{}";
        let header = signature_header(SECRET, 1_000, payload);
        assert!(verify_signature(SECRET, payload, &header, 300, 1_000 + 301).is_err());
        assert!(verify_signature(SECRET, payload, &header, 300, 1_000 + 299).is_ok());
    }

    #[test]
    fn test_any_v1_signature_accepted() {
        let payload = b"{}";
        let good = signature_header(SECRET, 50, payload);
        let good_sig = good.split("v1=").nth(1).unwrap();
        let header = format!("t=50,v1=deadbeef,v1={}", good_sig);
        assert!(verify_signature(SECRET, payload, &header, 300, 50).is_ok());
    }

    #[test]
    fn test_parse_checkout_completed() {
        let event = parse_event(&checkout_payload("checkout.session.completed")).unwrap();
        assert_eq!(event.event_type, WebhookEventType::CheckoutCompleted);

        let data = CheckoutCompletedData::from_event(&event).unwrap();
        assert_eq!(data.session_id, "cs_test_123");
        assert_eq!(data.customer_email, "buyer@example.com");
        assert_eq!(data.amount_total, 2500);
        assert_eq!(data.currency, "usd");
        assert!(data.is_paid());
        assert_eq!(data.cart_code(), Some("ABC123"));
        assert_eq!(data.cart_snapshot(), Some("1:2:1000;2:1:500"));
    }

    #[test]
    fn test_parse_rejects_malformed_payload() {
        let err = parse_event(b"not json").unwrap_err();
        assert!(matches!(err, ShopError::WebhookParseError(_)));
    }

    #[test]
    fn test_event_kinds() {
        assert_eq!(
            event_type_from_str("checkout.session.async_payment_succeeded"),
            WebhookEventType::AsyncPaymentSucceeded
        );
        assert_eq!(
            event_type_from_str("charge.refunded"),
            WebhookEventType::Unknown("charge.refunded".to_string())
        );
    }

    struct CountingHandler {
        fulfilled: AtomicUsize,
        ignored: AtomicUsize,
    }

    impl WebhookHandler for CountingHandler {
        type Outcome = ();

        fn on_checkout_completed(&self, _data: CheckoutCompletedData) -> ShopResult<()> {
            self.fulfilled.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn on_ignored_event(&self, _event: &WebhookEvent) -> ShopResult<()> {
            self.ignored.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_dispatch_webhook() {
        let handler = CountingHandler {
            fulfilled: AtomicUsize::new(0),
            ignored: AtomicUsize::new(0),
        };

        for kind in [
            "checkout.session.completed",
            "checkout.session.async_payment_succeeded",
            "checkout.session.expired",
            "payment_intent.created",
        ] {
            let event = parse_event(&checkout_payload(kind)).unwrap();
            dispatch_webhook_event(&handler, &event).unwrap();
        }

        assert_eq!(handler.fulfilled.load(Ordering::SeqCst), 2);
        assert_eq!(handler.ignored.load(Ordering::SeqCst), 2);
    }
}
