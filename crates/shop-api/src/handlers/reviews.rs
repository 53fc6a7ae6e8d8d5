//! Review endpoints. Users are identified by email and created on first
//! review.

use super::catalog::ReviewView;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::{info, instrument};

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub product_id: i64,
    pub email: String,
    pub rating: i64,
    #[serde(default)]
    pub review: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReviewRequest {
    pub rating: i64,
    #[serde(default)]
    pub review: String,
}

/// Out-of-range ratings are rejected before they reach storage
fn rating(raw: i64) -> ApiResult<u8> {
    u8::try_from(raw)
        .ok()
        .filter(|r| shop_core::validate_rating(*r).is_ok())
        .ok_or_else(|| ApiError::validation("rating must be between 1 and 5"))
}

#[instrument(skip(state, payload))]
pub async fn create_review(
    State(state): State<AppState>,
    payload: Result<Json<CreateReviewRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ReviewView>)> {
    let Json(request) = payload?;
    let rating = rating(request.rating)?;

    let review = state.db.reviews().create(
        request.product_id,
        &request.email,
        rating,
        &request.review,
    )?;

    info!("Review {} added to product {}", review.id, review.product_id);
    Ok((StatusCode::CREATED, Json(ReviewView::from(&review))))
}

#[instrument(skip(state, payload))]
pub async fn update_review(
    State(state): State<AppState>,
    Path(review_id): Path<i64>,
    payload: Result<Json<UpdateReviewRequest>, JsonRejection>,
) -> ApiResult<Json<ReviewView>> {
    let Json(request) = payload?;
    let rating = rating(request.rating)?;

    let review = state.db.reviews().update(review_id, rating, &request.review)?;
    Ok(Json(ReviewView::from(&review)))
}

pub async fn delete_review(
    State(state): State<AppState>,
    Path(review_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.db.reviews().delete(review_id)?;
    Ok(StatusCode::NO_CONTENT)
}
