//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use api::AppState;
use api::security::SaltedSha256Hasher;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> axum::Router {
    let state = AppState::in_memory("storefront-test", SaltedSha256Hasher::new(10));
    api::create_app(Arc::new(state), get_metrics_handle())
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn register(app: &axum::Router, email: &str) -> String {
    let (status, user) = send(
        app,
        "POST",
        "/v1/users/register",
        Some(json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": email,
            "age": 25,
            "password": "analytical-engine"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{user}");
    user["id"].as_str().unwrap().to_string()
}

async fn create_product(app: &axum::Router, price: &str, quantity: i32) -> String {
    let (status, product) = send(
        app,
        "POST",
        "/v1/products",
        Some(json!({
            "description": "Brass gear",
            "tags": ["parts"],
            "price": price,
            "quantity": quantity
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{product}");
    product["id"].as_str().unwrap().to_string()
}

async fn place(
    app: &axum::Router,
    user_id: &str,
    lines: &[(&str, i32)],
) -> (StatusCode, Value) {
    let items: Vec<Value> = lines
        .iter()
        .map(|(product_id, quantity)| json!({ "product_id": product_id, "quantity": quantity }))
        .collect();
    send(
        app,
        "POST",
        "/v1/orders",
        Some(json!({ "user_id": user_id, "items": items })),
    )
    .await
}

async fn stock(app: &axum::Router, product_id: &str) -> i64 {
    let (status, product) = send(app, "GET", &format!("/v1/products/{product_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    product["quantity"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "storefront-test");
    assert_eq!(json["database"], "in-memory");
    assert!(json["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn test_order_lifecycle_end_to_end() {
    let app = setup();
    let user_id = register(&app, "ada@example.com").await;
    let product_id = create_product(&app, "10.50", 100).await;

    let (status, order) = place(&app, &user_id, &[(&product_id, 2)]).await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["status"], "pending");
    assert_eq!(order["total_price"], "21.00");
    assert_eq!(order["user_id"], user_id.as_str());
    assert_eq!(order["items"][0]["product_price"], "10.50");
    assert_eq!(order["items"][0]["product_description"], "Brass gear");
    assert_eq!(order["items"][0]["quantity"], 2);
    assert_eq!(stock(&app, &product_id).await, 98);

    let order_id = order["id"].as_str().unwrap();
    let (status, order) = send(&app, "PUT", &format!("/v1/orders/{order_id}/confirm"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "confirmed");

    let (status, order) = send(&app, "PUT", &format!("/v1/orders/{order_id}/complete"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "completed");

    let (status, err) = send(&app, "PUT", &format!("/v1/orders/{order_id}/cancel"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(err["error"].as_str().unwrap().contains("cancel"));

    let (status, loaded) = send(&app, "GET", &format!("/v1/orders/{order_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loaded["status"], "completed");
    assert_eq!(loaded["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_cancel_pending_order() {
    let app = setup();
    let user_id = register(&app, "ada@example.com").await;
    let product_id = create_product(&app, "3.00", 5).await;

    let (_, order) = place(&app, &user_id, &[(&product_id, 1)]).await;
    let order_id = order["id"].as_str().unwrap();

    let (status, order) = send(&app, "PUT", &format!("/v1/orders/{order_id}/cancel"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "cancelled");

    let (status, _) = send(&app, "PUT", &format!("/v1/orders/{order_id}/confirm"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_insufficient_stock_rolls_back_every_line() {
    let app = setup();
    let user_id = register(&app, "ada@example.com").await;
    let plenty = create_product(&app, "1.00", 10).await;
    let scarce = create_product(&app, "2.00", 1).await;

    let (status, err) = place(&app, &user_id, &[(&plenty, 4), (&scarce, 2)]).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(err["error"].as_str().unwrap().contains(&scarce));
    assert_eq!(stock(&app, &plenty).await, 10);
    assert_eq!(stock(&app, &scarce).await, 1);

    let (status, orders) = send(&app, "GET", &format!("/v1/users/{user_id}/orders"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let app = setup();
    let user_id = register(&app, "ada@example.com").await;
    let missing = uuid_like();

    let (status, _) = place(&app, &user_id, &[(&missing, 1)]).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", &format!("/v1/products/{missing}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", &format!("/v1/orders/{missing}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_requests_are_bad_requests() {
    let app = setup();
    let user_id = register(&app, "ada@example.com").await;
    let product_id = create_product(&app, "1.00", 10).await;

    let (status, _) = place(&app, &user_id, &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = place(&app, &user_id, &[(&product_id, 0)]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, err) = place(&app, "not-a-uuid", &[(&product_id, 1)]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].as_str().unwrap().contains("user"));

    let (status, _) = send(&app, "GET", "/v1/orders/12345", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/v1/products",
        Some(json!({ "description": "Gear", "price": "-1", "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(stock(&app, &product_id).await, 10);
}

#[tokio::test]
async fn test_registration_rules() {
    let app = setup();

    let (status, user) = send(
        &app,
        "POST",
        "/v1/users/register",
        Some(json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "Ada@Example.com",
            "age": 36,
            "is_married": true,
            "password": "analytical-engine"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["email"], "ada@example.com");
    assert_eq!(user["is_married"], true);
    assert!(user.get("password_hash").is_none());
    assert!(user.get("password").is_none());

    let (status, _) = send(
        &app,
        "POST",
        "/v1/users/register",
        Some(json!({
            "first_name": "Ada",
            "last_name": "King",
            "email": "ada@example.com",
            "age": 36,
            "password": "another-password"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "POST",
        "/v1/users/register",
        Some(json!({
            "first_name": "Young",
            "last_name": "Person",
            "email": "young@example.com",
            "age": 17,
            "password": "long-enough-pw"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let user_id = user["id"].as_str().unwrap();
    let (status, loaded) = send(&app, "GET", &format!("/v1/users/{user_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loaded["first_name"], "Ada");
}

#[tokio::test]
async fn test_login() {
    let app = setup();
    let user_id = register(&app, "ada@example.com").await;

    let login = |email: &str, password: &str| json!({ "email": email, "password": password });

    let (status, user) = send(
        &app,
        "POST",
        "/v1/users/login",
        Some(login("ada@example.com", "analytical-engine")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["id"], user_id.as_str());

    let (wrong_status, wrong) = send(
        &app,
        "POST",
        "/v1/users/login",
        Some(login("ada@example.com", "difference-engine")),
    )
    .await;
    let (unknown_status, unknown) = send(
        &app,
        "POST",
        "/v1/users/login",
        Some(login("nobody@example.com", "analytical-engine")),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong, unknown);
}

#[tokio::test]
async fn test_price_change_keeps_order_snapshot() {
    let app = setup();
    let user_id = register(&app, "ada@example.com").await;
    let product_id = create_product(&app, "10.50", 10).await;

    let (_, order) = place(&app, &user_id, &[(&product_id, 1)]).await;
    let order_id = order["id"].as_str().unwrap();

    let (status, product) = send(
        &app,
        "PUT",
        &format!("/v1/products/{product_id}/price"),
        Some(json!({ "price": "12.00" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["price"], "12.00");

    let (_, order) = send(&app, "GET", &format!("/v1/orders/{order_id}"), None).await;
    assert_eq!(order["total_price"], "10.50");
    assert_eq!(order["items"][0]["product_price"], "10.50");
}

#[tokio::test]
async fn test_stock_adjustment() {
    let app = setup();
    let product_id = create_product(&app, "1.00", 3).await;
    let uri = format!("/v1/products/{product_id}/stock");

    let (status, product) = send(&app, "PUT", &uri, Some(json!({ "quantity": 7 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["quantity"], 10);

    let (status, _) = send(&app, "PUT", &uri, Some(json!({ "quantity": -11 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, product) = send(&app, "PUT", &uri, Some(json!({ "delta": -4 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["quantity"], 6);
    assert_eq!(stock(&app, &product_id).await, 6);

    let (status, _) = send(&app, "PUT", &uri, Some(json!({ "delta": i32::MAX }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(stock(&app, &product_id).await, 6);
}

#[tokio::test]
async fn test_unrepresentable_order_total_is_a_bad_request() {
    let app = setup();
    let user_id = register(&app, "ada@example.com").await;
    let product_id = create_product(&app, "79228162514264337593543950335", 10).await;

    let (status, body) = place(&app, &user_id, &[(&product_id, 2)]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(stock(&app, &product_id).await, 10);
}

#[tokio::test]
async fn test_listings_are_paginated() {
    let app = setup();
    let user_id = register(&app, "ada@example.com").await;
    let product_id = create_product(&app, "1.00", 10).await;
    for _ in 0..2 {
        create_product(&app, "2.00", 1).await;
    }

    let mut placed = Vec::new();
    for _ in 0..3 {
        let (status, order) = place(&app, &user_id, &[(&product_id, 1)]).await;
        assert_eq!(status, StatusCode::CREATED);
        placed.push(order["id"].as_str().unwrap().to_string());
    }

    let orders_uri = format!("/v1/users/{user_id}/orders");
    let (_, first) = send(&app, "GET", &format!("{orders_uri}?limit=2"), None).await;
    let (_, rest) = send(&app, "GET", &format!("{orders_uri}?limit=2&offset=2"), None).await;
    let first = first.as_array().unwrap();
    let rest = rest.as_array().unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(rest.len(), 1);

    let mut seen: Vec<String> = first
        .iter()
        .chain(rest)
        .map(|o| o["id"].as_str().unwrap().to_string())
        .collect();
    seen.sort();
    placed.sort();
    assert_eq!(seen, placed);

    let (_, products) = send(&app, "GET", "/v1/products?limit=2", None).await;
    assert_eq!(products.as_array().unwrap().len(), 2);
    let (_, products) = send(&app, "GET", "/v1/products?limit=0&offset=-4", None).await;
    assert_eq!(products.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    let user_id = register(&app, "ada@example.com").await;
    let product_id = create_product(&app, "1.00", 1).await;
    place(&app, &user_id, &[(&product_id, 1)]).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        api::routes::metrics::CONTENT_TYPE
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("orders_placed_total"));
}

fn uuid_like() -> String {
    common::ProductId::new().to_string()
}
