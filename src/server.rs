use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use tracing::{info, warn};

use crate::AppState;
use crate::access::{GuardDecision, LOGIN_PATH, View};
use crate::api::types::{NewAdmin, OrderStatus, ProductDraft};
use crate::config::AppConfig;
use crate::navigation;
use crate::session::{FileStorage, RestoreOutcome, Role};
use crate::ui::{layout, pages, views as render};
use crate::views::Tab;

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let storage = Arc::new(FileStorage::new(&config.storage.session_file));
    let state = AppState::new(Arc::clone(&config), storage)?;

    match state.session.restore() {
        RestoreOutcome::Restored(identity) => info!(
            name: "server.session_restored",
            username = %identity.username,
            "Resuming persisted session"
        ),
        RestoreOutcome::Expired => info!(name: "server.session_expired", "Persisted session expired"),
        RestoreOutcome::Corrupt => warn!(name: "server.session_corrupt", "Persisted session discarded"),
        RestoreOutcome::Empty => {}
    }

    let app = router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        backend = %config.backend.base_url,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the dashboard router around `state`.
pub fn router(state: AppState) -> Router {
    let static_dir = state.config.server.static_dir.clone();
    Router::new()
        .route(LOGIN_PATH, get(login_page))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/healthz", get(healthz))
        .route("/dashboard", get(dashboard_root))
        .route("/dashboard/{view}", get(view_page))
        .route("/dashboard/products", get(view_page).post(create_product))
        .route("/dashboard/products/{id}", post(update_product))
        .route("/dashboard/products/{id}/delete", post(delete_product))
        .route("/dashboard/orders/{id}/status", post(update_order_status))
        .route("/dashboard/users", get(view_page).post(create_staff))
        .route("/dashboard/users/{id}/delete", post(delete_user))
        .route("/dashboard/system-logs/{id}/archive", post(archive_log))
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Gatekeeping and rendering
// ─────────────────────────────────────────────────────────────────────────────

/// Run the guard for `uri`; anything but `Allow` becomes the response.
fn admit(state: &AppState, uri: &Uri) -> Result<View, Response> {
    let path = uri.path();
    match state.guard.check(path) {
        GuardDecision::Allow(view) => Ok(view),
        GuardDecision::Pending => Err(Html(pages::loading_page(path)).into_response()),
        GuardDecision::Fallback { to } => Err(Redirect::to(&to).into_response()),
        GuardDecision::Login { from } => {
            // Action sub-paths are POST-only; come back to the owning view.
            let from = match View::from_path(&from) {
                Some(view) if view.path() != from => view.path(),
                _ => uri
                    .path_and_query()
                    .map_or(from, |pq| pq.as_str().to_string()),
            };
            Err(Redirect::to(&navigation::Redirect::to_login(&from).location).into_response())
        }
        GuardDecision::Forbidden {
            view,
            role,
            redirect_to,
        } => Err((
            StatusCode::FORBIDDEN,
            Html(pages::unauthorized_page(view, role, &redirect_to)),
        )
            .into_response()),
    }
}

/// Render `view` from controller state, unless the session ended meanwhile.
fn respond(state: &AppState, view: View) -> Response {
    if let Some(redirect) = state.navigator.take_redirect() {
        state.dashboard.close_all();
        return Redirect::to(&redirect.location).into_response();
    }
    let Some(identity) = state.session.identity() else {
        return Redirect::to(&navigation::Redirect::to_login(&view.path()).location)
            .into_response();
    };

    let session = &state.session;
    let dashboard = &state.dashboard;
    let content = match view {
        View::Analytics => render::analytics(&dashboard.analytics.snapshot()),
        View::Products => render::products(&dashboard.products.snapshot(), session),
        View::Orders => render::orders(&dashboard.orders.snapshot(), session),
        View::Users => render::users(
            dashboard.users.tab(),
            &dashboard.users.team(),
            &dashboard.users.customers(),
            session,
        ),
        View::Monitoring => render::monitoring(&dashboard.monitoring.snapshot()),
        View::Logs => render::logs(
            &dashboard.logs.snapshot(),
            &dashboard.logs.query(),
            session,
        ),
    };
    Html(layout::dashboard_shell(view, &identity, session, &content)).into_response()
}

// ─────────────────────────────────────────────────────────────────────────────
// Public pages
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LoginParams {
    #[serde(default)]
    from: Option<String>,
}

/// GET / - Login form, or straight through when already signed in.
async fn login_page(State(state): State<AppState>, Query(params): Query<LoginParams>) -> Response {
    state.navigator.visit(LOGIN_PATH);
    let _ = state.navigator.take_redirect();

    if state.session.is_restoring() {
        return Html(pages::loading_page(LOGIN_PATH)).into_response();
    }
    if state.session.identity().is_some() {
        let target = navigation::Redirect::after_login(params.from.as_deref());
        return Redirect::to(&target.location).into_response();
    }
    Html(pages::login_page(None, params.from.as_deref(), "")).into_response()
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    username: String,
    password: String,
    #[serde(default)]
    from: Option<String>,
}

/// POST /login - Exchange credentials for a session.
async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    match state
        .session
        .login(&state.api, form.username.trim(), &form.password)
        .await
    {
        Ok(_) => {
            let target = navigation::Redirect::after_login(form.from.as_deref());
            Redirect::to(&target.location).into_response()
        }
        Err(e) => (
            StatusCode::UNAUTHORIZED,
            Html(pages::login_page(
                Some(&e.user_message()),
                form.from.as_deref(),
                &form.username,
            )),
        )
            .into_response(),
    }
}

/// POST /logout
async fn logout(State(state): State<AppState>) -> Response {
    state.session.logout();
    state.dashboard.close_all();
    state.navigator.visit(LOGIN_PATH);
    let _ = state.navigator.take_redirect();
    Redirect::to(LOGIN_PATH).into_response()
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    signed_in: bool,
}

/// GET /healthz
async fn healthz(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        signed_in: state.session.session().is_some(),
    })
}

async fn dashboard_root() -> Redirect {
    Redirect::to(&View::DEFAULT.path())
}

async fn fallback() -> Redirect {
    Redirect::to(&View::DEFAULT.path())
}

// ─────────────────────────────────────────────────────────────────────────────
// Dashboard views
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct ViewParams {
    #[serde(default)]
    tab: Option<String>,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    action: Option<String>,
}

/// GET /dashboard/{view} - Mount the view and fetch its data.
async fn view_page(
    State(state): State<AppState>,
    Query(params): Query<ViewParams>,
    uri: Uri,
) -> Response {
    let view = match admit(&state, &uri) {
        Ok(view) => view,
        Err(response) => return response,
    };
    let location = uri
        .path_and_query()
        .map_or_else(|| view.path(), |pq| pq.as_str().to_string());
    state.navigator.visit(&location);

    let dashboard = &state.dashboard;
    match view {
        View::Analytics => dashboard.analytics.open().await,
        View::Products => dashboard.products.open().await,
        View::Orders => dashboard.orders.open().await,
        View::Users => {
            let tab = params
                .tab
                .as_deref()
                .and_then(|t| t.parse::<Tab>().ok())
                .unwrap_or_default();
            dashboard.users.open(tab).await;
        }
        View::Monitoring => dashboard.monitoring.open().await,
        View::Logs => dashboard.logs.open(params.page, params.action).await,
    }
    respond(&state, view)
}

/// Product editor fields. Numbers arrive as text so a blank or garbled input
/// becomes an inline error rather than a rejected form.
#[derive(Debug, Deserialize)]
struct ProductForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    price: String,
    #[serde(default)]
    stock: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    description: String,
}

impl TryFrom<ProductForm> for ProductDraft {
    type Error = &'static str;

    fn try_from(form: ProductForm) -> Result<Self, Self::Error> {
        let price = form
            .price
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite())
            .ok_or(INVALID_PRICE)?;
        let stock = form
            .stock
            .trim()
            .parse::<i64>()
            .map_err(|_| INVALID_STOCK)?;
        let category = if form.category.trim().is_empty() {
            "General".to_string()
        } else {
            form.category.trim().to_string()
        };
        Ok(Self {
            name: form.name.trim().to_string(),
            price,
            description: form.description,
            stock,
            category,
        })
    }
}

const INVALID_PRICE: &str = "Price must be a number.";
const INVALID_STOCK: &str = "Stock must be a whole number.";

/// POST /dashboard/products
async fn create_product(
    State(state): State<AppState>,
    uri: Uri,
    Form(form): Form<ProductForm>,
) -> Response {
    let view = match admit(&state, &uri) {
        Ok(view) => view,
        Err(response) => return response,
    };
    let products = &state.dashboard.products;
    match ProductDraft::try_from(form) {
        Ok(draft) => {
            products.save(None, &draft).await;
        }
        Err(message) => products.reject(message),
    }
    respond(&state, view)
}

/// POST /dashboard/products/{id}
async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    uri: Uri,
    Form(form): Form<ProductForm>,
) -> Response {
    let view = match admit(&state, &uri) {
        Ok(view) => view,
        Err(response) => return response,
    };
    let products = &state.dashboard.products;
    match ProductDraft::try_from(form) {
        Ok(draft) => {
            products.save(Some(&id), &draft).await;
        }
        Err(message) => products.reject(message),
    }
    respond(&state, view)
}

/// POST /dashboard/products/{id}/delete
async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    uri: Uri,
) -> Response {
    let view = match admit(&state, &uri) {
        Ok(view) => view,
        Err(response) => return response,
    };
    state.dashboard.products.delete(&id).await;
    respond(&state, view)
}

#[derive(Debug, Deserialize)]
struct StatusForm {
    status: String,
}

/// POST /dashboard/orders/{id}/status
async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    uri: Uri,
    Form(form): Form<StatusForm>,
) -> Response {
    let view = match admit(&state, &uri) {
        Ok(view) => view,
        Err(response) => return response,
    };
    let status = match form.status.parse::<OrderStatus>() {
        Ok(status) => status,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };
    state.dashboard.orders.update_status(&id, status).await;
    respond(&state, view)
}

#[derive(Debug, Deserialize)]
struct StaffForm {
    username: String,
    password: String,
    role: Role,
}

/// POST /dashboard/users
async fn create_staff(
    State(state): State<AppState>,
    uri: Uri,
    Form(form): Form<StaffForm>,
) -> Response {
    let view = match admit(&state, &uri) {
        Ok(view) => view,
        Err(response) => return response,
    };
    let admin = NewAdmin {
        username: form.username.trim().to_string(),
        password: form.password,
        role: form.role,
    };
    state.dashboard.users.create(&admin).await;
    respond(&state, view)
}

#[derive(Debug, Default, Deserialize)]
struct DeleteUserForm {
    #[serde(default)]
    tab: Option<String>,
}

/// POST /dashboard/users/{id}/delete - Deletes from the tab the row was
/// listed on, falling back to the active tab.
async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    uri: Uri,
    Form(form): Form<DeleteUserForm>,
) -> Response {
    let view = match admit(&state, &uri) {
        Ok(view) => view,
        Err(response) => return response,
    };
    let users = &state.dashboard.users;
    let tab = form
        .tab
        .as_deref()
        .and_then(|t| t.parse::<Tab>().ok())
        .unwrap_or_else(|| users.tab());
    users.delete(tab, &id).await;
    respond(&state, view)
}

/// POST /dashboard/system-logs/{id}/archive
async fn archive_log(
    State(state): State<AppState>,
    Path(id): Path<String>,
    uri: Uri,
) -> Response {
    let view = match admit(&state, &uri) {
        Ok(view) => view,
        Err(response) => return response,
    };
    state.dashboard.logs.archive(&id).await;
    respond(&state, view)
}
