use axum::http::{HeaderValue, StatusCode};
use axum::http::header::AUTHORIZATION;
use axum_test::TestServer;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};

use shopdeploy_api::infra::payment::StripePaymentClient;
use shopdeploy_api::router::build_router;
use shopdeploy_api::state::AppState;
use shopdeploy_auth_types::cookie::CookieSettings;
use shopdeploy_core::middleware::REQUEST_ID_HEADER;
use shopdeploy_testing::auth::MockAuth;

use crate::helpers::test_secrets;

/// Router over a database that is never reached: every request here is
/// decided by extractors and guards before any repository call.
fn test_server() -> TestServer {
    let state = AppState {
        db: DatabaseConnection::Disconnected,
        jwt: test_secrets(),
        cookies: CookieSettings::default(),
        payments: StripePaymentClient::new("https://api.stripe.com", None).unwrap(),
        payment_currency: "inr".into(),
    };
    TestServer::new(build_router(state)).unwrap()
}

fn assert_failure(body: &Value, kind: &str) {
    assert_eq!(body["success"], false);
    assert_eq!(body["kind"], kind);
    assert!(body["message"].is_string());
}

// ── Health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_report_live_but_not_ready_without_database() {
    let server = test_server();

    let live = server.get("/healthz").await;
    assert_eq!(live.status_code(), StatusCode::OK);

    let ready = server.get("/readyz").await;
    assert_eq!(ready.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn should_attach_request_id_to_responses() {
    let server = test_server();

    let response = server.get("/healthz").await;

    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
}

// ── Authentication guards ────────────────────────────────────────────────────

#[tokio::test]
async fn should_require_token_for_cart_and_orders() {
    let server = test_server();

    for path in ["/cart", "/orders", "/auth/me"] {
        let response = server.get(path).await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED, "{path}");
        assert_failure(&response.json::<Value>(), "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn should_reject_garbage_bearer_token() {
    let server = test_server();

    let response = server
        .get("/cart")
        .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer not-a-jwt"))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn should_reject_refresh_without_token() {
    let server = test_server();

    let response = server.post("/auth/refresh-token").await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_failure(&response.json::<Value>(), "INVALID_REFRESH_TOKEN");
}

// ── Admin guards ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_forbid_customers_on_admin_routes() {
    let server = test_server();
    let customer = MockAuth::customer();

    let create_category = server
        .post("/categories")
        .add_header(AUTHORIZATION, customer.bearer())
        .json(&json!({ "name": "Toys" }))
        .await;
    assert_eq!(create_category.status_code(), StatusCode::FORBIDDEN);
    assert_failure(&create_category.json::<Value>(), "FORBIDDEN");

    let delete_product = server
        .delete("/products/0195f3a4-7c2e-7d41-9b0a-3f6e2c1d4a55")
        .add_header(AUTHORIZATION, customer.bearer())
        .await;
    assert_eq!(delete_product.status_code(), StatusCode::FORBIDDEN);

    let all_orders = server
        .get("/orders/all")
        .add_header(AUTHORIZATION, customer.bearer())
        .await;
    assert_eq!(all_orders.status_code(), StatusCode::FORBIDDEN);

    let set_status = server
        .put("/orders/0195f3a4-7c2e-7d41-9b0a-3f6e2c1d4a55/status")
        .add_header(AUTHORIZATION, customer.bearer())
        .json(&json!({ "status": "shipped" }))
        .await;
    assert_eq!(set_status.status_code(), StatusCode::FORBIDDEN);
}

// ── Request validation ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_wrap_bad_path_id_in_validation_envelope() {
    let server = test_server();

    let response = server.get("/products/not-a-uuid").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_failure(&response.json::<Value>(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn should_wrap_bad_json_in_validation_envelope() {
    let server = test_server();

    let response = server
        .post("/auth/login")
        .json(&json!({ "email": "a@b.co" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_failure(&response.json::<Value>(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn should_wrap_bad_query_in_validation_envelope() {
    let server = test_server();

    let response = server.get("/products?minPrice=cheap").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_failure(&response.json::<Value>(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn should_reject_unknown_order_status_value() {
    let server = test_server();
    let admin = MockAuth::admin();

    let response = server
        .put("/orders/0195f3a4-7c2e-7d41-9b0a-3f6e2c1d4a55/status")
        .add_header(AUTHORIZATION, admin.bearer())
        .json(&json!({ "status": "teleported" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_failure(&response.json::<Value>(), "VALIDATION_ERROR");
}
