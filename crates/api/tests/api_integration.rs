//! Integration tests for the API server.

use std::sync::Arc;
use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use channel::StockChannel;
use domain::ProductRepository;
use metrics_exporter_prometheus::PrometheusHandle;
use ordering::Reconciler;
use stock::StockCounters;
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

fn setup() -> (axum::Router, Arc<api::AppState>, Reconciler) {
    let (state, reconciler) = api::create_default_state();
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state, reconciler)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn post_json_as(uri: &str, member_id: &str, roles: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-member-id", member_id)
        .header("x-member-roles", roles)
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_as(uri: &str, member_id: &str, roles: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-member-id", member_id)
        .header("x-member-roles", roles)
        .body(Body::empty())
        .unwrap()
}

/// Registers a member and returns its id.
async fn register_member(app: &axum::Router, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(post_json(
            "/member/create",
            serde_json::json!({"email": email, "name": "Tester"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["result"].as_str().unwrap().to_string()
}

/// Registers a product with stock as an admin and returns its id.
async fn register_product(app: &axum::Router, admin_id: &str, stock: i64) -> String {
    let response = app
        .clone()
        .oneshot(post_json_as(
            "/product/create",
            admin_id,
            "ADMIN",
            serde_json::json!({
                "name": "Widget",
                "category": "tools",
                "price_cents": 1000,
                "stock_quantity": stock
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["result"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_check() {
    let (app, _, _) = setup();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn member_registration_and_duplicate_email() {
    let (app, _, _) = setup();

    register_member(&app, "a@example.com").await;

    let response = app
        .oneshot(post_json(
            "/member/create",
            serde_json::json!({"email": "a@example.com", "name": "Other"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["error"], "conflict");
}

#[tokio::test]
async fn place_order_happy_path() {
    let (app, state, _) = setup();

    let member_id = register_member(&app, "buyer@example.com").await;
    let admin_id = register_member(&app, "admin@example.com").await;
    let product_id = register_product(&app, &admin_id, 10).await;

    let response = app
        .clone()
        .oneshot(post_json_as(
            "/ordering/create",
            &member_id,
            "USER",
            serde_json::json!([{"product_id": product_id, "product_count": 3}]),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["status_code"], 201);
    assert!(json["result"].as_str().is_some());

    // The reservation event is queued for reconciliation.
    assert_eq!(state.channel.depth().await.unwrap(), 1);

    // The member's own list shows the committed order.
    let response = app
        .oneshot(get_as("/ordering/myorders", &member_id, "USER"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["result"].as_array().unwrap().len(), 1);
    assert_eq!(json["result"][0]["status"], "PLACED");
}

#[tokio::test]
async fn insufficient_stock_is_a_conflict() {
    let (app, _, _) = setup();

    let member_id = register_member(&app, "buyer@example.com").await;
    let admin_id = register_member(&app, "admin@example.com").await;
    let product_id = register_product(&app, &admin_id, 2).await;

    let response = app
        .oneshot(post_json_as(
            "/ordering/create",
            &member_id,
            "USER",
            serde_json::json!([{"product_id": product_id, "product_count": 5}]),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["error"], "conflict");
    assert!(
        json["message"]
            .as_str()
            .unwrap()
            .contains("Insufficient stock")
    );
}

#[tokio::test]
async fn order_for_unknown_product_is_not_found() {
    let (app, _, _) = setup();

    let member_id = register_member(&app, "buyer@example.com").await;

    let response = app
        .oneshot(post_json_as(
            "/ordering/create",
            &member_id,
            "USER",
            serde_json::json!([
                {"product_id": uuid::Uuid::new_v4().to_string(), "product_count": 1}
            ]),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn placement_requires_identity() {
    let (app, _, _) = setup();

    let response = app
        .oneshot(post_json(
            "/ordering/create",
            serde_json::json!([
                {"product_id": uuid::Uuid::new_v4().to_string(), "product_count": 1}
            ]),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn order_list_requires_admin_role() {
    let (app, _, _) = setup();
    let member_id = register_member(&app, "buyer@example.com").await;

    let response = app
        .clone()
        .oneshot(get_as("/ordering/list", &member_id, "USER"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(get_as("/ordering/list", &member_id, "ADMIN"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn cancel_restores_stock_and_rejects_second_cancel() {
    let (app, state, reconciler) = setup();

    let member_id = register_member(&app, "buyer@example.com").await;
    let admin_id = register_member(&app, "admin@example.com").await;
    let product_id = register_product(&app, &admin_id, 10).await;

    let response = app
        .clone()
        .oneshot(post_json_as(
            "/ordering/create",
            &member_id,
            "USER",
            serde_json::json!([{"product_id": product_id, "product_count": 4}]),
        ))
        .await
        .unwrap();
    let order_id = body_json(response).await["result"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(post_json_as(
            &format!("/ordering/cancel/{order_id}"),
            &member_id,
            "USER",
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Drain the queue: the authoritative record converges back to 10.
    reconciler.drain().await.unwrap();
    let product = state
        .products
        .find_by_id(common::ProductId::from_uuid(
            uuid::Uuid::parse_str(&product_id).unwrap(),
        ))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.stock_quantity, 10);

    // Second cancel is a state conflict.
    let response = app
        .oneshot(post_json_as(
            &format!("/ordering/cancel/{order_id}"),
            &member_id,
            "USER",
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn cancel_of_foreign_order_is_forbidden() {
    let (app, _, _) = setup();

    let owner_id = register_member(&app, "owner@example.com").await;
    let other_id = register_member(&app, "other@example.com").await;
    let admin_id = register_member(&app, "admin@example.com").await;
    let product_id = register_product(&app, &admin_id, 10).await;

    let response = app
        .clone()
        .oneshot(post_json_as(
            "/ordering/create",
            &owner_id,
            "USER",
            serde_json::json!([{"product_id": product_id, "product_count": 1}]),
        ))
        .await
        .unwrap();
    let order_id = body_json(response).await["result"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(post_json_as(
            &format!("/ordering/cancel/{order_id}"),
            &other_id,
            "USER",
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // An admin may cancel any order.
    let response = app
        .oneshot(post_json_as(
            &format!("/ordering/cancel/{order_id}"),
            &admin_id,
            "ADMIN",
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn product_search_and_detail() {
    let (app, _, _) = setup();
    let admin_id = register_member(&app, "admin@example.com").await;
    let product_id = register_product(&app, &admin_id, 5).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/product/list?name=Wid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["result"].as_array().unwrap().len(), 1);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/product/detail/{product_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["result"]["stock_quantity"], 5);
}

#[tokio::test]
async fn product_update_reseeds_counter() {
    let (app, state, _) = setup();
    let admin_id = register_member(&app, "admin@example.com").await;
    let product_id = register_product(&app, &admin_id, 5).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/product/update/{product_id}"))
                .header("content-type", "application/json")
                .header("x-member-id", &admin_id)
                .header("x-member-roles", "ADMIN")
                .body(Body::from(
                    serde_json::to_string(&serde_json::json!({"stock_quantity": 42})).unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let counter = state
        .counters
        .get(common::ProductId::from_uuid(
            uuid::Uuid::parse_str(&product_id).unwrap(),
        ))
        .await
        .unwrap();
    assert_eq!(counter, 42);
}

#[tokio::test]
async fn myinfo_returns_profile() {
    let (app, _, _) = setup();
    let member_id = register_member(&app, "me@example.com").await;

    let response = app
        .oneshot(get_as("/member/myinfo", &member_id, "USER"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["result"]["email"], "me@example.com");
}
