mod common;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
};
use hov_admin::api::types::{NewAdmin, ProductDraft};
use hov_admin::api::{ApiClient, ApiError};
use hov_admin::session::{
    AuthState, EndReason, MemoryStorage, Role, SessionEvent, SessionStorage, SessionStore,
};
use serde_json::{Value, json};

use common::{Recorder, fresh_token, seeded_storage, spawn_backend};

fn signed_in(token: &str, role: &str) -> (SessionStore, Arc<MemoryStorage>) {
    let storage = seeded_storage(token, "pat", Some(role));
    let store = SessionStore::new(Arc::clone(&storage) as Arc<dyn SessionStorage>);
    store.restore();
    (store, storage)
}

#[tokio::test]
async fn test_bearer_token_is_attached() {
    let recorder = Recorder::default();
    let app = Router::new()
        .route(
            "/api/products",
            get(|State(rec): State<Recorder>, headers: HeaderMap| async move {
                rec.record(&headers);
                Json(json!([{"_id": "p1", "name": "Lamp", "price": 12.5, "stock": 3}]))
            }),
        )
        .with_state(recorder.clone());
    let base = spawn_backend(app).await;

    let token = fresh_token();
    let (store, _) = signed_in(&token, "admin");
    let client = ApiClient::new(&base, store).unwrap();

    let products = client.products().list().await.unwrap();

    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, "p1");
    assert_eq!(products[0].category, "General");
    assert_eq!(recorder.seen(), vec![Some(format!("Bearer {token}"))]);
}

#[tokio::test]
async fn test_unauthorized_response_clears_session_exactly_once() {
    let app = Router::new().route(
        "/api/orders",
        get(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"message": "Token expired"})),
            )
        }),
    );
    let base = spawn_backend(app).await;

    let (store, storage) = signed_in(&fresh_token(), "manager");
    let mut events = store.subscribe();
    let client = ApiClient::new(&base, store.clone()).unwrap();

    let (orders_a, orders_b) = (client.orders(), client.orders());
    let (first, second) = tokio::join!(orders_a.list(), orders_b.list());

    assert!(first.unwrap_err().is_unauthorized());
    assert!(second.unwrap_err().is_unauthorized());
    assert_eq!(store.state(), AuthState::SignedOut);
    assert!(storage.is_empty());
    assert_eq!(
        events.try_recv().unwrap(),
        SessionEvent::Ended(EndReason::Unauthorized)
    );
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_wrong_credentials_leave_storage_untouched() {
    let recorder = Recorder::default();
    let app = Router::new()
        .route(
            "/api/admin/login",
            post(|State(rec): State<Recorder>, headers: HeaderMap| async move {
                rec.record(&headers);
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"message": "Invalid credentials"})),
                )
            }),
        )
        .with_state(recorder.clone());
    let base = spawn_backend(app).await;

    let storage = Arc::new(MemoryStorage::new());
    let store = SessionStore::new(Arc::clone(&storage) as Arc<dyn SessionStorage>);
    store.restore();
    let mut events = store.subscribe();
    let client = ApiClient::new(&base, store.clone()).unwrap();

    let err = store.login(&client, "pat", "wrong").await.unwrap_err();

    assert_eq!(err.user_message(), "Invalid credentials");
    assert!(storage.is_empty());
    assert_eq!(store.state(), AuthState::SignedOut);
    assert!(events.try_recv().is_err());
    assert_eq!(recorder.seen(), vec![None]);
}

#[tokio::test]
async fn test_login_then_calls_carry_the_new_token() {
    let token = fresh_token();
    let grant = json!({
        "token": token,
        "admin": {"_id": "a1", "username": "root", "role": "superadmin"}
    });
    let recorder = Recorder::default();
    let app = Router::new()
        .route(
            "/api/admin/login",
            post(move |Json(body): Json<Value>| {
                let grant = grant.clone();
                async move {
                    assert_eq!(body["username"], "root");
                    Json(grant)
                }
            }),
        )
        .route(
            "/api/admin/stats",
            get(|State(rec): State<Recorder>, headers: HeaderMap| async move {
                rec.record(&headers);
                Json(json!({
                    "summary": {"totalRevenue": 10.5, "totalOrders": 2, "totalProducts": 7, "lowStockCount": 1},
                    "ordersChart": []
                }))
            }),
        )
        .with_state(recorder.clone());
    let base = spawn_backend(app).await;

    let storage = Arc::new(MemoryStorage::new());
    let store = SessionStore::new(Arc::clone(&storage) as Arc<dyn SessionStorage>);
    store.restore();
    let client = ApiClient::new(&base, store.clone()).unwrap();

    let session = store.login(&client, "root", "pw").await.unwrap();
    assert_eq!(session.identity.role, Some(Role::Superadmin));
    assert_eq!(storage.len(), 2);

    let stats = client.stats().overview().await.unwrap();
    assert_eq!(stats.total_products, 7);
    assert_eq!(recorder.seen(), vec![Some(format!("Bearer {token}"))]);
}

#[tokio::test]
async fn test_error_taxonomy() {
    let app = Router::new()
        .route(
            "/api/products",
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({"message": "Price must be positive"})),
                )
            }),
        )
        .route(
            "/api/orders/{id}",
            put(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response() }),
        )
        .route("/api/orders", get(|| async { "not json" }));
    let base = spawn_backend(app).await;

    let (store, _) = signed_in(&fresh_token(), "superadmin");
    let client = ApiClient::new(&base, store.clone()).unwrap();

    let draft = ProductDraft {
        name: "Lamp".into(),
        price: -1.0,
        description: String::new(),
        stock: 0,
        category: "Home".into(),
    };
    let rejected = client.products().create(&draft).await.unwrap_err();
    assert!(matches!(rejected, ApiError::Rejected { status: 422, .. }));
    assert_eq!(rejected.user_message("Operation failed."), "Price must be positive");

    let server = client
        .orders()
        .set_status("o1", hov_admin::api::types::OrderStatus::Shipped)
        .await
        .unwrap_err();
    assert!(matches!(server, ApiError::Server { status: 500, .. }));

    let malformed = client.orders().list().await.unwrap_err();
    assert!(matches!(malformed, ApiError::MalformedBody(_)));

    // None of these end the session.
    assert!(store.session().is_some());
}

#[tokio::test]
async fn test_unreachable_backend_is_a_transport_error() {
    let (store, _) = signed_in(&fresh_token(), "admin");
    let client = ApiClient::new("http://127.0.0.1:9/api", store.clone()).unwrap();

    let err = client.products().list().await.unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(err.status(), None);
    assert!(store.session().is_some());
}

#[tokio::test]
async fn test_register_accepts_wrapped_and_bare_admins() {
    let app = Router::new().route(
        "/api/admin/register",
        post(|Json(body): Json<Value>| async move {
            let admin = json!({"_id": "n1", "username": body["username"], "role": body["role"]});
            if body["username"] == "wrapped" {
                Json(json!({ "admin": admin }))
            } else {
                Json(admin)
            }
        }),
    );
    let base = spawn_backend(app).await;
    let (store, _) = signed_in(&fresh_token(), "superadmin");
    let client = ApiClient::new(&base, store).unwrap();

    for username in ["wrapped", "bare"] {
        let created = client
            .staff()
            .register(&NewAdmin {
                username: username.into(),
                password: "pw".into(),
                role: Role::Manager,
            })
            .await
            .unwrap();
        assert_eq!(created.username, username);
        assert_eq!(created.role.as_deref(), Some("manager"));
    }
}
