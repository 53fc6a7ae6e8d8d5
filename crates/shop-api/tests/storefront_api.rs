//! Catalog, cart, review and wishlist endpoints.

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::{json, Value};

#[tokio::test]
async fn test_health() {
    let app = spawn_app().await;

    let response = app.server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["payment_provider"], "stripe");
}

#[tokio::test]
async fn test_products_and_detail() {
    let app = spawn_app().await;
    create_product(&app.db, "Coffee Mug", 1250);

    let body: Value = app.server.get("/api/products").await.json();
    assert_eq!(body["count"], 1);
    assert_eq!(body["products"][0]["price"], 12.5);
    assert_eq!(body["products"][0]["slug"], "coffee-mug");

    let detail: Value = app.server.get("/api/products/coffee-mug").await.json();
    assert_eq!(detail["name"], "Coffee Mug");
    assert_eq!(detail["rating"]["total_reviews"], 0);
    assert!(detail["reviews"].as_array().unwrap().is_empty());

    app.server
        .get("/api/products/missing")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_categories() {
    let app = spawn_app().await;
    let kitchen = app.db.catalog().create_category("Kitchen", None).unwrap();
    app.db
        .catalog()
        .create_product(&shop_db::NewProduct {
            name: "Kettle".to_string(),
            price: 3000,
            category_id: Some(kitchen.id),
            ..Default::default()
        })
        .unwrap();

    let body: Value = app.server.get("/api/categories").await.json();
    assert_eq!(body["count"], 1);

    let detail: Value = app.server.get("/api/categories/kitchen").await.json();
    assert_eq!(detail["name"], "Kitchen");
    assert_eq!(detail["products"][0]["name"], "Kettle");

    app.server
        .get("/api/categories/garden")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search() {
    let app = spawn_app().await;
    create_product(&app.db, "Coffee Mug", 1250);
    create_product(&app.db, "Sticker", 300);

    let body: Value = app.server.get("/api/search?query=MUG").await.json();
    assert_eq!(body["count"], 1);
    assert_eq!(body["products"][0]["name"], "Coffee Mug");

    app.server
        .get("/api/search")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    app.server
        .get("/api/search?query=")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cart_lifecycle() {
    let app = spawn_app().await;
    let mug = create_product(&app.db, "Mug", 1000);

    let cart: Value = app
        .server
        .post("/api/cart/items")
        .json(&json!({ "cart_code": "XYZ789", "product_id": mug.id }))
        .await
        .json();
    assert_eq!(cart["cart_code"], "XYZ789");
    assert_eq!(cart["cart_total"], 10.0);
    let item_id = cart["items"][0]["id"].as_i64().unwrap();

    let item: Value = app
        .server
        .put(&format!("/api/cart/items/{}", item_id))
        .json(&json!({ "quantity": 3 }))
        .await
        .json();
    assert_eq!(item["quantity"], 3);
    assert_eq!(item["sub_total"], 30.0);

    let stats: Value = app.server.get("/api/cart/XYZ789/stats").await.json();
    assert_eq!(stats["total_quantity"], 3);

    app.server
        .put(&format!("/api/cart/items/{}", item_id))
        .json(&json!({ "quantity": 0 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    app.server
        .put(&format!("/api/cart/items/{}", item_id))
        .json(&json!({ "quantity": 3_000_000_000u32 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let stats: Value = app.server.get("/api/cart/XYZ789/stats").await.json();
    assert_eq!(stats["total_quantity"], 3);

    app.server
        .delete(&format!("/api/cart/items/{}", item_id))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    app.server
        .delete(&format!("/api/cart/items/{}", item_id))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let cart: Value = app.server.get("/api/cart/XYZ789").await.json();
    assert!(cart["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cart_rejects_bad_input() {
    let app = spawn_app().await;
    let mug = create_product(&app.db, "Mug", 1000);

    app.server
        .post("/api/cart/items")
        .json(&json!({ "cart_code": "WAYTOOLONGCODE", "product_id": mug.id }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.server
        .post("/api/cart/items")
        .json(&json!({ "cart_code": "ABC123", "product_id": 424242 }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.server
        .post("/api/cart/items")
        .json(&json!({ "cart_code": "ABC123" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.server
        .get("/api/cart/NOPE")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reviews_update_rating() {
    let app = spawn_app().await;
    let mug = create_product(&app.db, "Mug", 1000);

    let response = app
        .server
        .post("/api/reviews")
        .json(&json!({
            "product_id": mug.id,
            "email": "ada@example.com",
            "rating": 4,
            "review": "Keeps coffee warm"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let review: Value = response.json();
    assert_eq!(review["rating_label"], "Very Good");
    assert!(review["user"].get("email").is_none());
    let review_id = review["id"].as_i64().unwrap();

    app.server
        .post("/api/reviews")
        .json(&json!({ "product_id": mug.id, "email": "bob@example.com", "rating": 2 }))
        .await
        .assert_status(StatusCode::CREATED);

    let detail: Value = app.server.get("/api/products/mug").await.json();
    assert_eq!(detail["rating"]["average_rating"], 3.0);
    assert_eq!(detail["rating"]["total_reviews"], 2);
    assert_eq!(detail["reviews"].as_array().unwrap().len(), 2);

    app.server
        .put(&format!("/api/reviews/{}", review_id))
        .json(&json!({ "rating": 5, "review": "Even better" }))
        .await
        .assert_status_ok();
    let detail: Value = app.server.get("/api/products/mug").await.json();
    assert_eq!(detail["rating"]["average_rating"], 3.5);

    app.server
        .delete(&format!("/api/reviews/{}", review_id))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let detail: Value = app.server.get("/api/products/mug").await.json();
    assert_eq!(detail["rating"]["total_reviews"], 1);
    assert_eq!(detail["rating"]["average_rating"], 2.0);
}

#[tokio::test]
async fn test_review_conflicts_and_bounds() {
    let app = spawn_app().await;
    let mug = create_product(&app.db, "Mug", 1000);
    let review = json!({ "product_id": mug.id, "email": "ada@example.com", "rating": 4 });

    app.server
        .post("/api/reviews")
        .json(&review)
        .await
        .assert_status(StatusCode::CREATED);
    app.server
        .post("/api/reviews")
        .json(&review)
        .await
        .assert_status(StatusCode::CONFLICT);

    for rating in [0, 6, -1] {
        app.server
            .post("/api/reviews")
            .json(&json!({ "product_id": mug.id, "email": "bob@example.com", "rating": rating }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    app.server
        .delete("/api/reviews/9999")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wishlist_toggle() {
    let app = spawn_app().await;
    let mug = create_product(&app.db, "Mug", 1000);
    let body = json!({ "email": "ada@example.com", "product_id": mug.id });

    let added = app.server.post("/api/wishlist").json(&body).await;
    added.assert_status(StatusCode::CREATED);
    assert_eq!(added.json::<Value>()["product_id"], mug.id);

    app.server
        .post("/api/wishlist")
        .json(&body)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let user = app.db.users().by_email("ada@example.com").unwrap().unwrap();
    assert!(app.db.wishlists().for_user(user.id).unwrap().is_empty());
}

#[tokio::test]
async fn test_checkout_pages() {
    let app = spawn_app().await;

    let page = app
        .server
        .get("/checkout/success")
        .add_query_param("session_id", "cs_test_abc")
        .await;
    page.assert_status_ok();
    assert!(page.text().contains("cs_test_abc"));

    app.server.get("/checkout/cancel").await.assert_status_ok();
}
