//! # Routes
//!
//! Axum router configuration for the storefront API.

use crate::handlers::{self, cart, catalog, checkout, orders, pages, reviews, webhook, wishlist};
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Catalog:
///   - GET  /api/products, /api/products/{slug}
///   - GET  /api/categories, /api/categories/{slug}
///   - GET  /api/search?query=
///
/// - Cart:
///   - POST /api/cart/items
///   - GET  /api/cart/{cart_code}, /api/cart/{cart_code}/stats
///   - PUT, DELETE /api/cart/items/{item_id}
///
/// - Reviews & wishlist:
///   - POST /api/reviews, PUT/DELETE /api/reviews/{id}
///   - POST /api/wishlist
///
/// - Checkout & orders:
///   - POST /api/checkout
///   - GET  /api/orders/{session_id}
///
/// - Webhooks (no CORS, raw body):
///   - POST /webhook/stripe
///
/// - Static pages:
///   - GET /checkout/success, /checkout/cancel
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let checkout_pages = Router::new()
        .route("/success", get(pages::checkout_success))
        .route("/cancel", get(pages::checkout_cancel));

    let api_routes = Router::new()
        // Catalog
        .route("/products", get(catalog::list_products))
        .route("/products/{slug}", get(catalog::get_product))
        .route("/categories", get(catalog::list_categories))
        .route("/categories/{slug}", get(catalog::get_category))
        .route("/search", get(catalog::search))
        // Cart
        .route("/cart/items", post(cart::add_item))
        .route(
            "/cart/items/{item_id}",
            put(cart::update_quantity).delete(cart::remove_item),
        )
        .route("/cart/{cart_code}", get(cart::get_cart))
        .route("/cart/{cart_code}/stats", get(cart::cart_stats))
        // Reviews & wishlist
        .route("/reviews", post(reviews::create_review))
        .route(
            "/reviews/{review_id}",
            put(reviews::update_review).delete(reviews::delete_review),
        )
        .route("/wishlist", post(wishlist::toggle))
        // Checkout & orders
        .route("/checkout", post(checkout::create_checkout))
        .route("/orders/{session_id}", get(orders::get_order))
        .layer(cors);

    let webhook_routes = Router::new().route("/stripe", post(webhook::stripe_webhook));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/checkout", checkout_pages)
        .nest("/api", api_routes)
        .nest("/webhook", webhook_routes)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
