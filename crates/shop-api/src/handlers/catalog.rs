//! Catalog browsing and search

use super::{product_views, ProductView};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use shop_core::{rating_label, Category, ProductRating, Review};
use tracing::instrument;

const SIMILAR_PRODUCTS: u32 = 4;

#[derive(Debug, Serialize)]
pub struct ReviewView {
    pub id: i64,
    pub rating: u8,
    pub rating_label: &'static str,
    pub review: String,
    pub user: shop_core::User,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        Self {
            id: review.id,
            rating: review.rating,
            rating_label: rating_label(review.rating),
            review: review.review.clone(),
            user: review.user.clone(),
            created_at: review.created_at.to_rfc3339(),
            updated_at: review.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: ProductView,
    pub rating: ProductRating,
    pub reviews: Vec<ReviewView>,
    pub similar_products: Vec<ProductView>,
}

#[derive(Debug, Serialize)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    pub products: Vec<ProductView>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: Option<String>,
}

/// Featured products
pub async fn list_products(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let products = state.db.catalog().featured_products()?;
    Ok(Json(serde_json::json!({
        "products": product_views(&products),
        "count": products.len()
    })))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<ProductDetail>> {
    let catalog = state.db.catalog();
    let (product, rating) = catalog.product_by_slug(&slug)?;
    let reviews = state.db.reviews().for_product(product.id)?;
    let similar = catalog.similar_products(&product, SIMILAR_PRODUCTS)?;

    Ok(Json(ProductDetail {
        product: ProductView::from(&product),
        rating,
        reviews: reviews.iter().map(ReviewView::from).collect(),
        similar_products: product_views(&similar),
    }))
}

pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let categories = state.db.catalog().list_categories()?;
    Ok(Json(serde_json::json!({
        "categories": categories,
        "count": categories.len()
    })))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<CategoryDetail>> {
    let (category, products) = state.db.catalog().category_by_slug(&slug)?;
    Ok(Json(CategoryDetail {
        category,
        products: product_views(&products),
    }))
}

#[instrument(skip(state, params))]
pub async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Query(params) = params?;
    let query = params
        .query
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::validation("No query provided"))?;

    let products = state.db.catalog().search(&query)?;
    Ok(Json(serde_json::json!({
        "query": query,
        "products": product_views(&products),
        "count": products.len()
    })))
}
