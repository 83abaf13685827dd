//! HTTP client for the shop backend.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::{Url, form_urlencoded};
use uuid::Uuid;

use super::error::ApiError;
use super::types::{
    ActivityLog, AdminStatsResponse, AdminUser, AnalyticsStats, Customer, DashboardStats, LogPage,
    NewAdmin, Order, OrderStatus, OrderStatusUpdate, Product, ProductDraft, RegisterResponse,
};
use crate::session::{AuthBackend, Credentials, EndReason, LoginGrant, SessionStore};

/// Page size used by the audit log view.
pub const LOG_PAGE_SIZE: u32 = 20;

/// Client for the backend REST API.
///
/// Every request goes through [`ApiClient::request`], which attaches the
/// current bearer token and applies the global 401 policy: the session that
/// sent the rejected token is ended in the [`SessionStore`], which then
/// announces [`SessionEvent::Ended`](crate::session::SessionEvent::Ended).
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use hov_admin::api::ApiClient;
/// use hov_admin::session::{MemoryStorage, SessionStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let session = SessionStore::new(Arc::new(MemoryStorage::new()));
/// let client = ApiClient::new("https://shop.example.com/api", session)?;
///
/// let products = client.products().list().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
    session: SessionStore,
}

impl ApiClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Backend API root, path prefix included (e.g. "https://host/api")
    /// * `session` - Store the bearer token is read from
    pub fn new(base_url: impl AsRef<str>, session: SessionStore) -> Result<Self, ApiError> {
        Self::with_client(base_url, reqwest::Client::new(), session)
    }

    /// Create a new client with a custom reqwest client.
    pub fn with_client(
        base_url: impl AsRef<str>,
        http: reqwest::Client,
        session: SessionStore,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url.as_ref())?;
        Ok(Self {
            base_url,
            http,
            session,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the product catalog.
    pub fn products(&self) -> ProductsApi<'_> {
        ProductsApi { client: self }
    }

    /// Access orders.
    pub fn orders(&self) -> OrdersApi<'_> {
        OrdersApi { client: self }
    }

    /// Access staff accounts.
    pub fn staff(&self) -> StaffApi<'_> {
        StaffApi { client: self }
    }

    /// Access shopper accounts.
    pub fn customers(&self) -> CustomersApi<'_> {
        CustomersApi { client: self }
    }

    /// Access the audit log.
    pub fn logs(&self) -> LogsApi<'_> {
        LogsApi { client: self }
    }

    /// Access analytics and health summaries.
    pub fn stats(&self) -> StatsApi<'_> {
        StatsApi { client: self }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Core request path
    // ─────────────────────────────────────────────────────────────────────────

    /// Issue an authenticated request and return the decoded JSON body.
    ///
    /// An empty 2xx body decodes to [`Value::Null`].
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let token = self.session.token();
        self.send(method, path, body, token.as_deref()).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let value = self.request(Method::GET, path, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        let value = self.request(Method::POST, path, Some(&body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn put<B>(&self, path: &str, body: &B) -> Result<Value, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.request(Method::PUT, path, Some(&body)).await
    }

    pub async fn patch(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::PATCH, path, None).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.request(Method::DELETE, path, None).await.map(|_| ())
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<Value, ApiError> {
        let url = self.endpoint(path)?;
        let request_id = Uuid::new_v4();

        let mut builder = self
            .http
            .request(method.clone(), url)
            .header("x-request-id", request_id.to_string());
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    name: "api.transport_failed",
                    method = %method,
                    path,
                    request_id = %request_id,
                    error = %e,
                    "Backend unreachable"
                );
                return Err(ApiError::Transport(e));
            }
        };

        let status = response.status();
        let text = response.text().await.map_err(ApiError::Transport)?;
        debug!(
            name: "api.response",
            method = %method,
            path,
            status = status.as_u16(),
            request_id = %request_id,
            "Backend responded"
        );

        if status == StatusCode::UNAUTHORIZED {
            if let Some(token) = token {
                self.session.end_if_current(token, EndReason::Unauthorized);
            }
            return Err(ApiError::Unauthorized {
                message: error_message(&text),
            });
        }

        if !status.is_success() {
            let message = error_message(&text);
            warn!(
                name: "api.request_failed",
                method = %method,
                path,
                status = status.as_u16(),
                message = message.as_deref().unwrap_or(""),
                "Backend rejected request"
            );
            return Err(if status.is_client_error() {
                ApiError::Rejected {
                    status: status.as_u16(),
                    message,
                }
            } else {
                ApiError::Server {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl AuthBackend for ApiClient {
    /// `POST /admin/login`. Sent without a bearer token, so a 401 here is a
    /// plain credential failure and never ends a session.
    async fn authenticate(&self, credentials: &Credentials) -> Result<LoginGrant, ApiError> {
        let body = serde_json::to_value(credentials)?;
        let value = self
            .send(Method::POST, "/admin/login", Some(&body), None)
            .await?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Pull `message` out of a JSON error body.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(ToString::to_string)
}

/// Percent-encode a single path segment.
fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

// =============================================================================
// Products API
// =============================================================================

#[derive(Debug)]
pub struct ProductsApi<'a> {
    client: &'a ApiClient,
}

impl ProductsApi<'_> {
    pub async fn list(&self) -> Result<Vec<Product>, ApiError> {
        self.client.get("/products").await
    }

    pub async fn create(&self, draft: &ProductDraft) -> Result<Value, ApiError> {
        self.client.post("/products", draft).await
    }

    pub async fn update(&self, id: &str, draft: &ProductDraft) -> Result<Value, ApiError> {
        self.client
            .put(&format!("/products/{}", segment(id)), draft)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/products/{}", segment(id)))
            .await
    }
}

// =============================================================================
// Orders API
// =============================================================================

#[derive(Debug)]
pub struct OrdersApi<'a> {
    client: &'a ApiClient,
}

impl OrdersApi<'_> {
    pub async fn list(&self) -> Result<Vec<Order>, ApiError> {
        self.client.get("/orders").await
    }

    pub async fn set_status(&self, id: &str, status: OrderStatus) -> Result<Value, ApiError> {
        self.client
            .put(
                &format!("/orders/{}", segment(id)),
                &OrderStatusUpdate { status },
            )
            .await
    }
}

// =============================================================================
// Staff API
// =============================================================================

#[derive(Debug)]
pub struct StaffApi<'a> {
    client: &'a ApiClient,
}

impl StaffApi<'_> {
    pub async fn list(&self) -> Result<Vec<AdminUser>, ApiError> {
        self.client.get("/admin/users").await
    }

    pub async fn register(&self, admin: &NewAdmin) -> Result<AdminUser, ApiError> {
        let response: RegisterResponse = self.client.post("/admin/register", admin).await?;
        Ok(response.into_admin())
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/admin/users/{}", segment(id)))
            .await
    }
}

// =============================================================================
// Customers API
// =============================================================================

#[derive(Debug)]
pub struct CustomersApi<'a> {
    client: &'a ApiClient,
}

impl CustomersApi<'_> {
    pub async fn list(&self) -> Result<Vec<Customer>, ApiError> {
        self.client.get("/auth/users").await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/auth/users/{}", segment(id)))
            .await
    }
}

// =============================================================================
// Logs API
// =============================================================================

#[derive(Debug)]
pub struct LogsApi<'a> {
    client: &'a ApiClient,
}

impl LogsApi<'_> {
    /// Fetch one page of the audit log, optionally filtered by action type.
    pub async fn page(&self, page: u32, action: Option<&str>) -> Result<LogPage, ApiError> {
        let query = {
            let mut query = form_urlencoded::Serializer::new(String::new());
            query
                .append_pair("page", &page.to_string())
                .append_pair("limit", &LOG_PAGE_SIZE.to_string());
            if let Some(action) = action.filter(|a| !a.is_empty()) {
                query.append_pair("actionType", action);
            }
            query.finish()
        };
        self.client
            .get(&format!("/admin/system-logs?{query}"))
            .await
    }

    pub async fn archive(&self, id: &str) -> Result<Option<ActivityLog>, ApiError> {
        let value = self
            .client
            .patch(&format!("/admin/system-logs/archive/{}", segment(id)))
            .await?;
        Ok(serde_json::from_value(value).ok())
    }
}

// =============================================================================
// Stats API
// =============================================================================

#[derive(Debug)]
pub struct StatsApi<'a> {
    client: &'a ApiClient,
}

impl StatsApi<'_> {
    pub async fn analytics(&self) -> Result<AnalyticsStats, ApiError> {
        self.client.get("/analytics/stats").await
    }

    pub async fn overview(&self) -> Result<DashboardStats, ApiError> {
        let response: AdminStatsResponse = self.client.get("/admin/stats").await?;
        Ok(response.summary)
    }
}
