//! Integration tests for product CRUD over HTTP.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode, header};
use catalog_integration_tests::TestContext;
use serde_json::json;

#[tokio::test]
async fn test_list_starts_empty() {
    let ctx = TestContext::new();

    let resp = ctx.get("/api/products").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, json!([]));
}

#[tokio::test]
async fn test_create_then_read() {
    let ctx = TestContext::new();
    let token = ctx.token_for("jane@example.com").await;

    let resp = ctx
        .request(
            Method::POST,
            "/api/products",
            Some(&token),
            Some(json!({
                "name": "  Laptop  ",
                "description": "High-performance laptop",
                "price": 999.99,
                "imageUrl": "https://example.com/laptop.jpg",
            })),
        )
        .await;

    assert_eq!(resp.status, StatusCode::CREATED, "{:?}", resp.body);
    let id = resp.body["id"].as_i64().unwrap();
    assert_eq!(
        resp.headers.get(header::LOCATION).unwrap(),
        &format!("/api/products/{id}")
    );
    assert_eq!(resp.body["name"], "Laptop");
    assert_eq!(resp.body["price"], 999.99);
    assert_eq!(resp.body["isActive"], true);
    assert!(resp.body["createdAt"].is_string());
    assert!(resp.body.get("updatedAt").is_none());

    let fetched = ctx.get(&format!("/api/products/{id}")).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body, resp.body);

    let listed = ctx.get("/api/products").await;
    assert_eq!(listed.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_is_ordered_by_id() {
    let ctx = TestContext::new();
    let token = ctx.token_for("jane@example.com").await;
    for name in ["Laptop", "Smartphone", "Headphones"] {
        ctx.create_product(&token, name, 10.0).await;
    }

    let resp = ctx.get("/api/products").await;

    let names: Vec<_> = resp
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(names, ["Laptop", "Smartphone", "Headphones"]);
}

#[tokio::test]
async fn test_create_validation_reports_every_problem() {
    let ctx = TestContext::new();
    let token = ctx.token_for("jane@example.com").await;

    let resp = ctx
        .request(
            Method::POST,
            "/api/products",
            Some(&token),
            Some(json!({ "description": "x".repeat(501) })),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"]["type"], "ValidationError");
    let message = resp.body["error"]["message"].as_str().unwrap();
    assert!(message.contains("Name is required"), "{message}");
    assert!(message.contains("Description must be at most 500"), "{message}");
    assert!(message.contains("Price is required"), "{message}");
}

#[tokio::test]
async fn test_create_rejects_non_positive_price() {
    let ctx = TestContext::new();
    let token = ctx.token_for("jane@example.com").await;

    for price in [0.0, -5.0] {
        let resp = ctx
            .request(
                Method::POST,
                "/api/products",
                Some(&token),
                Some(json!({ "name": "Freebie", "price": price })),
            )
            .await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "price {price}");
    }

    assert_eq!(ctx.get("/api/products").await.body, json!([]));
}

#[tokio::test]
async fn test_create_duplicate_name_ignores_case() {
    let ctx = TestContext::new();
    let token = ctx.token_for("jane@example.com").await;
    ctx.create_product(&token, "Laptop", 999.99).await;

    let resp = ctx
        .request(
            Method::POST,
            "/api/products",
            Some(&token),
            Some(json!({ "name": "LAPTOP", "price": 10 })),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"]["type"], "BusinessError");
    assert_eq!(
        resp.body["error"]["message"],
        "A product with the name 'LAPTOP' already exists."
    );
}

#[tokio::test]
async fn test_name_is_reusable_after_delete() {
    let ctx = TestContext::new();
    let token = ctx.token_for("jane@example.com").await;
    let first = ctx.create_product(&token, "Laptop", 999.99).await;
    let id = first["id"].as_i64().unwrap();

    let deleted = ctx
        .request(Method::DELETE, &format!("/api/products/{id}"), Some(&token), None)
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let second = ctx.create_product(&token, "Laptop", 899.99).await;
    assert_ne!(second["id"], first["id"]);
}

#[tokio::test]
async fn test_update_replaces_fields() {
    let ctx = TestContext::new();
    let token = ctx.token_for("jane@example.com").await;
    let created = ctx.create_product(&token, "Laptop", 999.99).await;
    let id = created["id"].as_i64().unwrap();

    let resp = ctx
        .request(
            Method::PUT,
            &format!("/api/products/{id}"),
            Some(&token),
            Some(json!({ "name": "Laptop Pro", "price": 1299.5 })),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK, "{:?}", resp.body);
    assert_eq!(resp.body["id"], created["id"]);
    assert_eq!(resp.body["name"], "Laptop Pro");
    assert_eq!(resp.body["price"], 1299.5);
    assert_eq!(resp.body["createdAt"], created["createdAt"]);
    assert!(resp.body["updatedAt"].is_string());
}

#[tokio::test]
async fn test_update_may_keep_own_name() {
    let ctx = TestContext::new();
    let token = ctx.token_for("jane@example.com").await;
    let created = ctx.create_product(&token, "Laptop", 999.99).await;
    let id = created["id"].as_i64().unwrap();

    let resp = ctx
        .request(
            Method::PUT,
            &format!("/api/products/{id}"),
            Some(&token),
            Some(json!({ "name": "laptop", "price": 899.99 })),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK, "{:?}", resp.body);
}

#[tokio::test]
async fn test_update_to_taken_name() {
    let ctx = TestContext::new();
    let token = ctx.token_for("jane@example.com").await;
    ctx.create_product(&token, "Laptop", 999.99).await;
    let phone = ctx.create_product(&token, "Smartphone", 699.99).await;
    let id = phone["id"].as_i64().unwrap();

    let resp = ctx
        .request(
            Method::PUT,
            &format!("/api/products/{id}"),
            Some(&token),
            Some(json!({ "name": "Laptop", "price": 699.99 })),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"]["type"], "BusinessError");
}

#[tokio::test]
async fn test_update_missing_product() {
    let ctx = TestContext::new();
    let token = ctx.token_for("jane@example.com").await;

    let resp = ctx
        .request(
            Method::PUT,
            "/api/products/999",
            Some(&token),
            Some(json!({ "name": "Ghost", "price": 1 })),
        )
        .await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(
        resp.body["error"]["message"],
        "Entity 'Product' with key '999' was not found."
    );
}

#[tokio::test]
async fn test_update_invalid_body_is_400_even_for_missing_id() {
    let ctx = TestContext::new();
    let token = ctx.token_for("jane@example.com").await;

    let resp = ctx
        .request(
            Method::PUT,
            "/api/products/999",
            Some(&token),
            Some(json!({ "name": "", "price": -1 })),
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"]["type"], "ValidationError");
}

#[tokio::test]
async fn test_update_can_deactivate() {
    let ctx = TestContext::new();
    let token = ctx.token_for("jane@example.com").await;
    let created = ctx.create_product(&token, "Laptop", 999.99).await;
    let id = created["id"].as_i64().unwrap();

    let resp = ctx
        .request(
            Method::PUT,
            &format!("/api/products/{id}"),
            Some(&token),
            Some(json!({ "name": "Laptop", "price": 999.99, "isActive": false })),
        )
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["isActive"], false);
    assert_eq!(
        ctx.get(&format!("/api/products/{id}")).await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_delete_hides_product_and_is_repeatable() {
    let ctx = TestContext::new();
    let token = ctx.token_for("jane@example.com").await;
    let created = ctx.create_product(&token, "Laptop", 999.99).await;
    let uri = format!("/api/products/{}", created["id"]);

    let first = ctx.request(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(first.status, StatusCode::NO_CONTENT);
    assert_eq!(first.body, serde_json::Value::Null);

    assert_eq!(ctx.get(&uri).await.status, StatusCode::NOT_FOUND);
    assert_eq!(ctx.get("/api/products").await.body, json!([]));

    let second = ctx.request(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(second.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_delete_unknown_product() {
    let ctx = TestContext::new();
    let token = ctx.token_for("jane@example.com").await;

    let resp = ctx
        .request(Method::DELETE, "/api/products/4242", Some(&token), None)
        .await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["error"]["type"], "NotFoundError");
}

#[tokio::test]
async fn test_non_numeric_id_is_rejected() {
    let ctx = TestContext::new();

    let resp = ctx.get("/api/products/abc").await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"]["type"], "ValidationError");
}
