//! Sales analytics and the system health overview. Both are read-only.

use tracing::warn;

use super::state::{Snapshot, ViewState};
use crate::api::ApiClient;
use crate::api::types::{AnalyticsStats, DashboardStats};

pub const ANALYTICS_FAILED: &str = "Failed to load analytics";
pub const OVERVIEW_FAILED: &str = "Failed to fetch dashboard data";

#[derive(Debug)]
pub struct AnalyticsView {
    api: ApiClient,
    state: ViewState<Option<AnalyticsStats>>,
}

impl AnalyticsView {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: ViewState::default(),
        }
    }

    pub async fn open(&self) {
        self.state.mount();
        let ticket = self.state.begin();
        let result = match self.api.stats().analytics().await {
            Ok(stats) => Ok(Some(stats)),
            Err(e) => {
                warn!(name: "analytics.load_failed", error = %e, "Analytics failed");
                Err(e.user_message(ANALYTICS_FAILED))
            }
        };
        self.state.settle(&ticket, result);
    }

    pub fn close(&self) {
        self.state.unmount();
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot<Option<AnalyticsStats>> {
        self.state.snapshot()
    }
}

/// Health check view backed by `GET /admin/stats`.
#[derive(Debug)]
pub struct MonitoringView {
    api: ApiClient,
    state: ViewState<Option<DashboardStats>>,
}

impl MonitoringView {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: ViewState::default(),
        }
    }

    pub async fn open(&self) {
        self.state.mount();
        let ticket = self.state.begin();
        let result = match self.api.stats().overview().await {
            Ok(stats) => Ok(Some(stats)),
            Err(e) => {
                warn!(name: "monitoring.load_failed", error = %e, "Health overview failed");
                Err(e.user_message(OVERVIEW_FAILED))
            }
        };
        self.state.settle(&ticket, result);
    }

    pub fn close(&self) {
        self.state.unmount();
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot<Option<DashboardStats>> {
        self.state.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::UNREACHABLE;
    use crate::session::Role;
    use crate::views::testing::unreachable_api;

    #[tokio::test]
    async fn test_unreachable_backend_is_reported_not_fatal() {
        let analytics = AnalyticsView::new(unreachable_api(Some(Role::Manager)));
        analytics.open().await;
        let snap = analytics.snapshot();
        assert_eq!(snap.data, None);
        assert_eq!(snap.error.as_deref(), Some(UNREACHABLE));

        let monitoring = MonitoringView::new(unreachable_api(Some(Role::Superadmin)));
        monitoring.open().await;
        assert!(!monitoring.snapshot().loading);
        assert!(monitoring.snapshot().error.is_some());
    }
}
