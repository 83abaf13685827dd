mod common;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post},
};
use axum_test::{TestResponse, TestServer};
use hov_admin::AppState;
use hov_admin::server::router;
use hov_admin::session::{MemoryStorage, RestoreOutcome, SessionStorage};
use serde_json::json;

use common::{Recorder, config, fresh_token, seeded_storage, spawn_backend, token};

fn location(response: &TestResponse) -> String {
    response
        .header("location")
        .to_str()
        .expect("ascii location")
        .to_string()
}

fn shop_backend(recorder: Recorder) -> Router {
    Router::new()
        .route(
            "/api/orders",
            get(|| async {
                Json(json!([{
                    "_id": "65f0c0ffee00000000abc123",
                    "items": [{"name": "Lamp", "qty": 2}],
                    "total": 25.0,
                    "status": "Pending"
                }]))
            }),
        )
        .route(
            "/api/analytics/stats",
            get(|| async {
                Json(json!({
                    "overview": {"totalRevenue": 99.5, "totalOrders": 3, "conversionRate": "2.5%", "viewsCount": 40},
                    "topPurchased": [{"_id": "Lamp", "totalSold": 5}],
                    "topBrowsed": [{"name": "Desk", "views": 12}],
                    "lowStock": []
                }))
            }),
        )
        .route(
            "/api/products",
            get(|| async { Json(json!([{"_id": "p1", "name": "Lamp", "price": 12.5, "stock": 3}])) }),
        )
        .route(
            "/api/products/{id}",
            delete(|State(rec): State<Recorder>, headers: HeaderMap| async move {
                rec.record(&headers);
                StatusCode::NO_CONTENT
            }),
        )
        .route(
            "/api/admin/stats",
            get(|| async {
                Json(json!({
                    "summary": {"totalRevenue": 1250.0, "totalOrders": 42, "totalProducts": 17, "lowStockCount": 3},
                    "ordersChart": [{"_id": "2024-05-01", "count": 4}]
                }))
            }),
        )
        .route(
            "/api/admin/users",
            get(|| async { Json(json!([{"_id": "s1", "username": "ops", "role": "admin"}])) }),
        )
        .route(
            "/api/auth/users/{id}",
            delete(|State(rec): State<Recorder>, headers: HeaderMap| async move {
                rec.record(&headers);
                StatusCode::NO_CONTENT
            }),
        )
        .route(
            "/api/admin/login",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"message": "Invalid credentials"})),
                )
            }),
        )
        .with_state(recorder)
}

async fn dashboard(storage: Arc<MemoryStorage>, backend: Router) -> (TestServer, AppState) {
    let base = spawn_backend(backend).await;
    let state = AppState::new(config(&base), storage as Arc<dyn SessionStorage>).unwrap();
    state.session.restore();
    let server = TestServer::new(router(state.clone())).unwrap();
    (server, state)
}

#[tokio::test]
async fn test_signed_out_visit_redirects_to_login_with_destination() {
    let (server, _) = dashboard(Arc::new(MemoryStorage::new()), shop_backend(Recorder::default())).await;

    let response = server.get("/dashboard/orders").await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?from=%2Fdashboard%2Forders");

    let login = server.get("/").add_query_param("from", "/dashboard/orders").await;
    assert_eq!(login.status_code(), StatusCode::OK);
    assert!(login.text().contains(r#"name="from" value="/dashboard/orders""#));
}

#[tokio::test]
async fn test_manager_is_refused_users_but_reaches_orders() {
    let storage = seeded_storage(&fresh_token(), "mia", Some("manager"));
    let (server, state) = dashboard(storage, shop_backend(Recorder::default())).await;

    let users = server.get("/dashboard/users").await;
    assert_eq!(users.status_code(), StatusCode::FORBIDDEN);
    let body = users.text();
    assert!(body.contains("Unauthorized Access"));
    assert!(body.contains("Your Role: <strong>manager</strong>"));
    assert!(body.contains("url=/dashboard/analytics"));
    assert!(state.session.session().is_some());

    let orders = server.get("/dashboard/orders").await;
    assert_eq!(orders.status_code(), StatusCode::OK);
    let body = orders.text();
    assert!(body.contains("#ABC123"));
    assert!(body.contains("Lamp x2"));
    assert!(!body.contains("Security Logs"));
}

#[tokio::test]
async fn test_expired_session_is_cleared_on_start() {
    let storage = seeded_storage(&token(Some(1_000)), "pat", Some("admin"));
    let base = spawn_backend(shop_backend(Recorder::default())).await;
    let state =
        AppState::new(config(&base), Arc::clone(&storage) as Arc<dyn SessionStorage>).unwrap();

    assert_eq!(state.session.restore(), RestoreOutcome::Expired);
    assert!(storage.is_empty());

    let server = TestServer::new(router(state)).unwrap();
    let response = server.get("/dashboard/analytics").await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/?from="));
}

#[tokio::test]
async fn test_pending_restore_renders_loading_page() {
    let base = spawn_backend(shop_backend(Recorder::default())).await;
    let state = AppState::new(config(&base), Arc::new(MemoryStorage::new())).unwrap();
    let server = TestServer::new(router(state)).unwrap();

    let response = server.get("/dashboard/orders").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("Loading..."));
}

#[tokio::test]
async fn test_failed_login_shows_backend_message() {
    let storage = Arc::new(MemoryStorage::new());
    let (server, state) = dashboard(Arc::clone(&storage), shop_backend(Recorder::default())).await;

    let response = server
        .post("/login")
        .form(&[("username", "pat"), ("password", "wrong"), ("from", "/dashboard/orders")])
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert!(response.text().contains("Invalid credentials"));
    assert!(storage.is_empty());
    assert!(state.session.session().is_none());
}

#[tokio::test]
async fn test_admin_cannot_delete_products() {
    let recorder = Recorder::default();
    let storage = seeded_storage(&fresh_token(), "ada", Some("admin"));
    let (server, _) = dashboard(storage, shop_backend(recorder.clone())).await;

    server.get("/dashboard/products").await;
    let response = server.post("/dashboard/products/p1/delete").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(
        response
            .text()
            .contains("You do not have permission to perform this action.")
    );
    assert!(recorder.seen().is_empty());
}

#[tokio::test]
async fn test_superadmin_delete_reaches_backend() {
    let recorder = Recorder::default();
    let token = fresh_token();
    let storage = seeded_storage(&token, "root", Some("superadmin"));
    let (server, _) = dashboard(storage, shop_backend(recorder.clone())).await;

    server.get("/dashboard/products").await;
    let response = server.post("/dashboard/products/p1/delete").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("Lamp"));
    assert_eq!(recorder.seen(), vec![Some(format!("Bearer {token}"))]);
}

#[tokio::test]
async fn test_unauthorized_backend_sends_operator_to_login_once() {
    let backend = Router::new().route(
        "/api/orders",
        get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({"message": "jwt expired"}))) }),
    );
    let storage = seeded_storage(&fresh_token(), "pat", Some("admin"));
    let (server, state) = dashboard(Arc::clone(&storage), backend).await;

    let response = server.get("/dashboard/orders").await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/?from=%2Fdashboard%2Forders");
    assert!(storage.is_empty());
    assert!(state.session.session().is_none());

    let login = server.get("/").add_query_param("from", "/dashboard/orders").await;
    assert_eq!(login.status_code(), StatusCode::OK);
    assert_eq!(state.navigator.take_redirect(), None);
}

#[tokio::test]
async fn test_logout_twice_is_harmless() {
    let storage = seeded_storage(&fresh_token(), "pat", Some("admin"));
    let (server, state) = dashboard(Arc::clone(&storage), shop_backend(Recorder::default())).await;

    for _ in 0..2 {
        let response = server.post("/logout").await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }
    assert!(storage.is_empty());
    assert!(state.session.session().is_none());
}

#[tokio::test]
async fn test_analytics_and_sidebar_for_superadmin() {
    let storage = seeded_storage(&fresh_token(), "root", Some("superadmin"));
    let (server, _) = dashboard(storage, shop_backend(Recorder::default())).await;

    let response = server.get("/dashboard").await;
    assert_eq!(location(&response), "/dashboard/analytics");

    let body = server.get("/dashboard/analytics").await.text();
    assert!(body.contains("$99.50"));
    assert!(body.contains("2.5%"));
    for label in ["Inventory", "User Management", "Health Check", "Security Logs"] {
        assert!(body.contains(label), "{label}");
    }
}

#[tokio::test]
async fn test_healthz() {
    let (server, _) = dashboard(Arc::new(MemoryStorage::new()), shop_backend(Recorder::default())).await;
    let response = server.get("/healthz").await;
    response.assert_status_ok();
    response.assert_json(&json!({"status": "ok", "signed_in": false}));
}

#[tokio::test]
async fn test_health_check_reads_summary_numbers() {
    let storage = seeded_storage(&fresh_token(), "root", Some("superadmin"));
    let (server, _) = dashboard(storage, shop_backend(Recorder::default())).await;

    let response = server.get("/dashboard/system-overview").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.text();
    assert!(body.contains("$1250.00"));
    assert!(body.contains(">17<"));
    assert!(!body.contains("Failed to fetch dashboard data"));
}

#[tokio::test]
async fn test_blank_stock_is_reported_inline() {
    let storage = seeded_storage(&fresh_token(), "ada", Some("admin"));
    let (server, _) = dashboard(storage, shop_backend(Recorder::default())).await;

    server.get("/dashboard/products").await;
    let response = server
        .post("/dashboard/products")
        .form(&[
            ("name", "Lamp"),
            ("price", "12.5"),
            ("stock", ""),
            ("category", "Home"),
            ("description", "Warm light"),
        ])
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.text();
    assert!(body.contains("Stock must be a whole number."));
    assert!(body.contains("Lamp"));
}

#[tokio::test]
async fn test_user_delete_follows_submitted_tab() {
    let recorder = Recorder::default();
    let token = fresh_token();
    let storage = seeded_storage(&token, "root", Some("superadmin"));
    let (server, state) = dashboard(storage, shop_backend(recorder.clone())).await;

    // Team tab is active on the server; the row came from the customers tab.
    server.get("/dashboard/users").await;
    assert_eq!(state.dashboard.users.tab(), hov_admin::views::Tab::Team);

    let response = server
        .post("/dashboard/users/c1/delete")
        .form(&[("tab", "customers")])
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(recorder.seen(), vec![Some(format!("Bearer {token}"))]);
}
