//! Shared fixtures: a fake shop backend on an ephemeral port and session seeding.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderMap;
use hov_admin::config::{
    AppConfig, BackendConfig, LogFormat, LoggingConfig, ServerConfig, StorageConfig,
};
use hov_admin::session::{IDENTITY_KEY, MemoryStorage, SessionStorage, TOKEN_KEY};
use jsonwebtoken::{EncodingKey, Header, encode};
use parking_lot::Mutex;
use serde_json::json;

/// Serve `app` on 127.0.0.1:0 and return its `/api` base URL.
pub async fn spawn_backend(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake backend");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake backend");
    });
    format!("http://{addr}/api")
}

/// HS256 token with the given `exp`; the signature is never checked.
pub fn token(exp: Option<i64>) -> String {
    let claims = match exp {
        Some(exp) => json!({"id": "u1", "exp": exp}),
        None => json!({"id": "u1"}),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"fake-backend"),
    )
    .expect("encode token")
}

/// A token valid well past any test run.
pub fn fresh_token() -> String {
    token(Some(chrono::Utc::now().timestamp() + 3600))
}

/// Storage holding a persisted session for `username` with `role`.
pub fn seeded_storage(token: &str, username: &str, role: Option<&str>) -> Arc<MemoryStorage> {
    let storage = Arc::new(MemoryStorage::new());
    storage.set(TOKEN_KEY, token).expect("seed token");
    let identity = match role {
        Some(role) => json!({"_id": "u1", "username": username, "role": role}),
        None => json!({"_id": "u1", "username": username}),
    };
    storage
        .set(IDENTITY_KEY, &identity.to_string())
        .expect("seed identity");
    storage
}

pub fn config(base_url: &str) -> Arc<AppConfig> {
    Arc::new(AppConfig {
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".into(),
            static_dir: "static".into(),
        },
        backend: BackendConfig {
            base_url: base_url.to_string(),
        },
        storage: StorageConfig {
            session_file: "unused.json".into(),
        },
        logging: LoggingConfig {
            format: LogFormat::Pretty,
        },
    })
}

/// Authorization headers seen by the fake backend, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<Option<String>>>>);

impl Recorder {
    pub fn record(&self, headers: &HeaderMap) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        self.0.lock().push(auth);
    }

    pub fn seen(&self) -> Vec<Option<String>> {
        self.0.lock().clone()
    }
}
