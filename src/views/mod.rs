//! View controllers: one per dashboard view.
//!
//! Each controller owns a [`ViewState`] cell, fetches on `open`, and turns
//! every backend failure into inline error text. Mutations are gated by the
//! role-capability table in [`crate::access::Action`] before any backend
//! call is made.

mod analytics;
mod logs;
mod orders;
mod products;
mod state;
mod users;

pub use analytics::{AnalyticsView, MonitoringView};
pub use logs::{LogQuery, LogsView};
pub use orders::OrdersView;
pub use products::ProductsView;
pub use state::{Snapshot, Ticket, ViewState};
pub use users::{Tab, UsersView};

use tracing::warn;

use crate::access::Action;
use crate::api::ApiClient;
use crate::session::SessionStore;

/// Inline error for an action the current role may not perform.
pub const FORBIDDEN_ACTION: &str = "You do not have permission to perform this action.";

fn permitted(session: &SessionStore, action: Action) -> bool {
    let allowed = session.has_role(action.allowed_roles());
    if !allowed {
        warn!(name: "views.action_refused", action = ?action, "Action refused for current role");
    }
    allowed
}

/// Every controller, sharing one [`ApiClient`].
#[derive(Debug)]
pub struct Dashboard {
    pub analytics: AnalyticsView,
    pub products: ProductsView,
    pub orders: OrdersView,
    pub users: UsersView,
    pub monitoring: MonitoringView,
    pub logs: LogsView,
}

impl Dashboard {
    #[must_use]
    pub fn new(api: &ApiClient) -> Self {
        Self {
            analytics: AnalyticsView::new(api.clone()),
            products: ProductsView::new(api.clone()),
            orders: OrdersView::new(api.clone()),
            users: UsersView::new(api.clone()),
            monitoring: MonitoringView::new(api.clone()),
            logs: LogsView::new(api.clone()),
        }
    }

    /// Tear every view down, e.g. when the session ends.
    pub fn close_all(&self) {
        self.analytics.close();
        self.products.close();
        self.orders.close();
        self.users.close();
        self.monitoring.close();
        self.logs.close();
    }
}
