//! HOV Admin
//!
//! Session and authorization core of the HOV store administration dashboard,
//! served as HTML by an Axum server that talks to the shop's REST backend.
//!
//! # Architecture
//!
//! - **Session**: token lifecycle, persistence and role checks
//! - **API client**: bearer-authenticated backend calls with a global 401 policy
//! - **Access**: role tables for views and actions, plus the navigation guard
//! - **Views**: one controller per dashboard screen
//! - **Server**: routes, rendering and start-up
//!
//! # Modules
//!
//! - [`session`]: [`SessionStore`](session::SessionStore) and its storage
//! - [`api`]: [`ApiClient`](api::ApiClient), error taxonomy and wire types
//! - [`access`]: views, actions, [`AuthorizationGuard`](access::AuthorizationGuard)
//! - [`navigation`]: turns session-ended events into login redirects
//! - [`views`]: view controllers and their state cells
//! - [`ui`]: HTML rendering

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod access;
pub mod api;
pub mod config;
pub mod navigation;
pub mod server;
pub mod session;
pub mod ui;
pub mod views;

use crate::access::AuthorizationGuard;
use crate::api::{ApiClient, ApiError};
use crate::config::AppConfig;
use crate::navigation::Navigator;
use crate::session::{SessionStorage, SessionStore};
use crate::views::Dashboard;

use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Global Configuration
    pub config: Arc<AppConfig>,
    /// The operator's session.
    pub session: SessionStore,
    /// Backend client bound to `session`.
    pub api: ApiClient,
    /// Pending redirects after a session ends.
    pub navigator: Arc<Navigator>,
    pub guard: AuthorizationGuard,
    /// View controllers.
    pub dashboard: Arc<Dashboard>,
}

impl AppState {
    /// Wire every service around one session. The session is left in the
    /// restoring state; call [`SessionStore::restore`] before serving.
    pub fn new(config: Arc<AppConfig>, storage: Arc<dyn SessionStorage>) -> Result<Self, ApiError> {
        let session = SessionStore::new(storage);
        let api = ApiClient::new(&config.backend.base_url, session.clone())?;
        let navigator = Arc::new(Navigator::new(&session));
        let guard = AuthorizationGuard::new(session.clone());
        let dashboard = Arc::new(Dashboard::new(&api));
        Ok(Self {
            config,
            session,
            api,
            navigator,
            guard,
            dashboard,
        })
    }
}
