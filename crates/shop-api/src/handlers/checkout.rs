//! Checkout session creation

use crate::checkout::{self, CheckoutForm, CheckoutResponse};
use crate::error::ApiResult;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::{error, instrument};

#[instrument(skip(state, payload))]
pub async fn create_checkout(
    State(state): State<AppState>,
    payload: Result<Json<CheckoutForm>, JsonRejection>,
) -> ApiResult<Json<CheckoutResponse>> {
    let Json(form) = payload?;

    let response = checkout::create_checkout(&state, &form)
        .await
        .inspect_err(|e| error!("Failed to create checkout: {}", e))?;

    Ok(Json(response))
}
