//! # shop-api
//!
//! HTTP API layer for storefront-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - REST endpoints for the catalog, carts, reviews and wishlists
//! - The checkout orchestrator and webhook-driven order fulfillment
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/api/products` | Featured products |
//! | GET | `/api/products/{slug}` | Product detail |
//! | GET | `/api/search?query=` | Product search |
//! | POST | `/api/cart/items` | Add to cart |
//! | POST | `/api/checkout` | Create checkout session |
//! | GET | `/api/orders/{session_id}` | Order for a paid session |
//! | POST | `/webhook/stripe` | Stripe webhook |

pub mod checkout;
pub mod config;
pub mod error;
pub mod fulfillment;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::{AppConfig, LogFormat};
pub use error::{ApiError, ApiResult};
pub use fulfillment::{FulfillmentHandler, FulfillmentOutcome};
pub use routes::create_router;
pub use state::AppState;
