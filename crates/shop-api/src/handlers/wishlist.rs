//! Wishlist toggle

use crate::error::ApiResult;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use shop_core::WishlistToggle;

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub email: String,
    pub product_id: i64,
}

/// 201 with the new entry when added, 204 when removed
pub async fn toggle(
    State(state): State<AppState>,
    payload: Result<Json<ToggleRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload?;
    let toggled = state
        .db
        .wishlists()
        .toggle(&request.email, request.product_id)?;

    let response = match toggled {
        WishlistToggle::Added(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        WishlistToggle::Removed => StatusCode::NO_CONTENT.into_response(),
    };
    Ok(response)
}
