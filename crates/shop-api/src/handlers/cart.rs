//! Cart endpoints

use super::ProductView;
use crate::error::ApiResult;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use shop_core::{Cart, CartItem, Currency};
use tracing::{info, instrument};

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub cart_code: String,
    pub product_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct CartItemView {
    pub id: i64,
    pub quantity: u32,
    pub product: ProductView,
    pub sub_total: f64,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id,
            quantity: item.quantity,
            product: ProductView::from(&item.product),
            sub_total: item.sub_total().as_decimal(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartView {
    pub id: i64,
    pub cart_code: String,
    pub items: Vec<CartItemView>,
    pub cart_total: f64,
    pub total_quantity: u32,
    pub created_at: String,
    pub updated_at: String,
}

impl CartView {
    fn new(cart: &Cart, currency: Currency) -> Self {
        Self {
            id: cart.id,
            cart_code: cart.cart_code.clone(),
            items: cart.items.iter().map(CartItemView::from).collect(),
            cart_total: cart.total(currency).as_decimal(),
            total_quantity: cart.total_quantity(),
            created_at: cart.created_at.to_rfc3339(),
            updated_at: cart.updated_at.to_rfc3339(),
        }
    }
}

/// Add a product to a cart, creating the cart on first use
#[instrument(skip(state, payload))]
pub async fn add_item(
    State(state): State<AppState>,
    payload: Result<Json<AddItemRequest>, JsonRejection>,
) -> ApiResult<Json<CartView>> {
    let Json(request) = payload?;
    let cart = state.db.carts().add_item(&request.cart_code, request.product_id)?;

    info!(
        "Cart {} now has {} items",
        cart.cart_code,
        cart.items.len()
    );
    Ok(Json(CartView::new(&cart, state.db.currency())))
}

pub async fn get_cart(
    State(state): State<AppState>,
    Path(cart_code): Path<String>,
) -> ApiResult<Json<CartView>> {
    let cart = state.db.carts().get(&cart_code)?;
    Ok(Json(CartView::new(&cart, state.db.currency())))
}

pub async fn cart_stats(
    State(state): State<AppState>,
    Path(cart_code): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let total_quantity = state.db.carts().total_quantity(&cart_code)?;
    Ok(Json(serde_json::json!({
        "cart_code": cart_code,
        "total_quantity": total_quantity
    })))
}

#[instrument(skip(state, payload))]
pub async fn update_quantity(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    payload: Result<Json<UpdateQuantityRequest>, JsonRejection>,
) -> ApiResult<Json<CartItemView>> {
    let Json(request) = payload?;
    let item = state.db.carts().update_quantity(item_id, request.quantity)?;
    Ok(Json(CartItemView::from(&item)))
}

pub async fn remove_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.db.carts().remove_item(item_id)?;
    Ok(StatusCode::NO_CONTENT)
}
