//! Order lookup by checkout session

use crate::error::ApiResult;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use shop_core::{Order, OrderItem, OrderStatus};

#[derive(Debug, Serialize)]
pub struct OrderItemView {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub sub_total: f64,
}

impl From<&OrderItem> for OrderItemView {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price.as_decimal(),
            sub_total: item.unit_price.times(item.quantity).as_decimal(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: i64,
    pub stripe_checkout_id: String,
    pub amount: f64,
    pub currency: &'static str,
    pub customer_email: String,
    pub status: OrderStatus,
    pub items: Vec<OrderItemView>,
    pub created_at: String,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            stripe_checkout_id: order.stripe_checkout_id.clone(),
            amount: order.amount.as_decimal(),
            currency: order.amount.currency.as_str(),
            customer_email: order.customer_email.clone(),
            status: order.status,
            items: order.items.iter().map(OrderItemView::from).collect(),
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<OrderView>> {
    let order = state.db.orders().by_session(&session_id)?;
    Ok(Json(OrderView::from(&order)))
}
