mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{TestContext, PASSWORD};

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new().await;
    let (status, body) = send(ctx.app(), Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "showroom-pos");
}

#[tokio::test]
async fn test_login_returns_bearer_token() {
    let ctx = TestContext::new().await;
    let (status, body) = send(
        ctx.app(),
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "cashier", "password": PASSWORD })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert_eq!(body["data"]["user"]["role"], "cashier");

    let token = body["data"]["token"].as_str().unwrap();
    let (status, profile) =
        send(ctx.app(), Method::GET, "/api/auth/profile", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["data"]["username"], "cashier");
    assert!(profile["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let ctx = TestContext::new().await;
    let (status, body) = send(
        ctx.app(),
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "cashier", "password": "not-the-password" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_protected_routes_require_a_token() {
    let ctx = TestContext::new().await;

    let (status, _) = send(ctx.app(), Method::GET, "/api/vehicles", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        ctx.app(),
        Method::GET,
        "/api/vehicles",
        Some("not-a-jwt"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_roles_are_enforced_per_route() {
    let ctx = TestContext::new().await;
    let mechanic = ctx.token(&ctx.mechanic);
    let cashier = ctx.token(&ctx.cashier);

    // Lectura abierta a cualquier rol
    let (status, _) = send(ctx.app(), Method::GET, "/api/vehicles", Some(&mechanic), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        ctx.app(),
        Method::GET,
        "/api/dashboard/admin",
        Some(&cashier),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        ctx.app(),
        Method::GET,
        "/api/transactions/sales",
        Some(&mechanic),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        ctx.app(),
        Method::POST,
        "/api/auth/register",
        Some(&cashier),
        Some(json!({
            "username": "intruder",
            "email": "intruder@showroom.test",
            "password": "secret123",
            "full_name": "Intruder",
            "role": "admin"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_validation_errors_are_bad_requests() {
    let ctx = TestContext::new().await;
    let admin = ctx.token(&ctx.admin);

    let (status, body) = send(
        ctx.app(),
        Method::POST,
        "/api/vehicles",
        Some(&admin),
        Some(json!({
            "code": "VH-500",
            "brand": "Toyota",
            "model": "Yaris",
            "year": 1850,
            "source_type": "supplier",
            "purchase_price": "1000",
            "condition_status": "good"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_repair_flow_over_http() {
    let ctx = TestContext::new().await;
    let cashier = ctx.token(&ctx.cashier);
    let mechanic = ctx.token(&ctx.mechanic);
    let vehicle = ctx.vehicle("VH-501", "Toyota", rust_decimal::Decimal::from(1000)).await;
    let part = ctx
        .spare_part("SP-501", rust_decimal::Decimal::from(50), 2, 0)
        .await;

    let (status, body) = send(
        ctx.app(),
        Method::POST,
        "/api/repairs",
        Some(&cashier),
        Some(json!({ "vehicle_id": vehicle.id, "mechanic_id": ctx.mechanic.id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["vehicle"]["status"], "in_repair");
    let order_id = body["data"]["id"].as_i64().unwrap();

    // El cajero no puede avanzar la orden
    let (status, _) = send(
        ctx.app(),
        Method::PATCH,
        &format!("/api/repairs/{}/progress", order_id),
        Some(&cashier),
        Some(json!({ "status": "in_progress" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        ctx.app(),
        Method::PATCH,
        &format!("/api/repairs/{}/progress", order_id),
        Some(&mechanic),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        ctx.app(),
        Method::POST,
        &format!("/api/repairs/{}/spare-parts", order_id),
        Some(&mechanic),
        Some(json!({ "spare_part_id": part.id, "quantity": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");

    let (status, body) = send(
        ctx.app(),
        Method::PATCH,
        &format!("/api/repairs/{}/progress", order_id),
        Some(&mechanic),
        Some(json!({
            "status": "in_progress",
            "spare_parts": [{ "spare_part_id": part.id, "quantity": 2 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "in_progress");
    assert_eq!(body["data"]["spare_parts"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        ctx.app(),
        Method::GET,
        &format!("/api/spare-parts/{}/availability?quantity=1", part.id),
        Some(&mechanic),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["available"], false);

    let (status, body) = send(
        ctx.app(),
        Method::GET,
        "/api/repairs?status=in_progress&page=1&page_size=5",
        Some(&mechanic),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["page_size"], 5);

    let (status, body) = send(
        ctx.app(),
        Method::GET,
        "/api/repairs?page=9223372036854775807",
        Some(&mechanic),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert!(body["data"]["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_resource_is_not_found() {
    let ctx = TestContext::new().await;
    let admin = ctx.token(&ctx.admin);

    let (status, body) = send(ctx.app(), Method::GET, "/api/vehicles/999", Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_token_for_unknown_user_is_rejected() {
    let ctx = TestContext::new().await;
    let token = ctx.token(&ctx.mechanic);

    let mut ghost = ctx.mechanic.clone();
    ghost.id = 999;
    let ghost_token = ctx.token(&ghost);

    let (status, _) = send(ctx.app(), Method::GET, "/api/repairs", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) =
        send(ctx.app(), Method::GET, "/api/repairs", Some(&ghost_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_mechanics_can_be_listed_for_assignment() {
    let ctx = TestContext::new().await;
    let cashier = ctx.token(&ctx.cashier);
    let mechanic = ctx.token(&ctx.mechanic);

    let (status, body) = send(
        ctx.app(),
        Method::GET,
        "/api/users?role=mechanic",
        Some(&cashier),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"], ctx.mechanic.id);
    assert!(users[0].get("password_hash").is_none());

    let (status, _) = send(ctx.app(), Method::GET, "/api/users", Some(&mechanic), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_customer_lookup_and_admin_only_delete() {
    let ctx = TestContext::new().await;
    let admin = ctx.token(&ctx.admin);
    let cashier = ctx.token(&ctx.cashier);

    let (status, body) = send(
        ctx.app(),
        Method::GET,
        "/api/customers/phone/%2B62%20812%205555%200101",
        Some(&cashier),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], ctx.customer.id);

    let (status, body) = send(
        ctx.app(),
        Method::GET,
        "/api/customers/email/budi@example.com",
        Some(&cashier),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Budi Santoso");

    let uri = format!("/api/customers/{}", ctx.customer.id);
    let (status, _) = send(ctx.app(), Method::DELETE, &uri, Some(&cashier), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(ctx.app(), Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(ctx.app(), Method::GET, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
