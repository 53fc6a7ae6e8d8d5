//! # Request Handlers
//!
//! Axum request handlers, one module per resource. Money leaves the API in
//! major units (`10.5` for $10.50).

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod pages;
pub mod reviews;
pub mod webhook;
pub mod wishlist;

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use shop_core::Product;

/// Product as rendered by the API
#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: f64,
    pub currency: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub featured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            description: product.description.clone(),
            price: product.price.as_decimal(),
            currency: product.price.currency.as_str(),
            image: product.image.clone(),
            featured: product.featured,
            category_id: product.category_id,
        }
    }
}

pub(crate) fn product_views(products: &[Product]) -> Vec<ProductView> {
    products.iter().map(ProductView::from).collect()
}

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let (status, db) = match state.db.ping() {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
    };

    (
        status,
        Json(serde_json::json!({
            "status": if status.is_success() { "healthy" } else { "degraded" },
            "service": "storefront",
            "version": env!("CARGO_PKG_VERSION"),
            "database": db,
            "payment_provider": state.strategy.provider_name(),
        })),
    )
}
