//! Stripe webhook endpoint

use crate::error::{ApiError, ApiResult};
use crate::fulfillment::FulfillmentHandler;
use crate::state::AppState;
use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use shop_core::ShopError;
use shop_stripe::{dispatch_webhook_event, SIGNATURE_HEADER};
use tracing::{info, instrument, warn};

/// Verify, then fulfill. Anything that fails verification or parsing is a
/// 400 with no side effects; storage failures are a 500 so Stripe retries.
#[instrument(skip(state, headers, body), fields(bytes = body.len()))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<serde_json::Value>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            ApiError(ShopError::WebhookVerificationFailed(
                "Missing Stripe-Signature header".to_string(),
            ))
        })?;

    let event = state
        .strategy
        .verify_webhook(&body, signature)
        .await
        .inspect_err(|e| warn!("Webhook rejected: {}", e))?;

    info!(
        "Received webhook: type={:?}, id={}",
        event.event_type, event.event_id
    );

    let handler = FulfillmentHandler::new(&state.db);
    let outcome = dispatch_webhook_event(&handler, &event)?;

    info!("Webhook {} handled: {}", event.event_id, outcome.label());
    Ok(Json(serde_json::json!({
        "received": true,
        "outcome": outcome.label()
    })))
}
