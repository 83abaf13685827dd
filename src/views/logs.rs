//! Security logs: paged audit trail with an action-type filter.

use parking_lot::RwLock;
use tracing::{info, warn};

use super::state::{Snapshot, Ticket, ViewState};
use super::{FORBIDDEN_ACTION, permitted};
use crate::access::Action;
use crate::api::ApiClient;
use crate::api::types::LogPage;

pub const LOAD_FAILED: &str = "Failed to load activity logs";
pub const ARCHIVE_FAILED: &str = "Archiving failed";

/// Which slice of the log is on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub page: u32,
    pub action: Option<String>,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            page: 1,
            action: None,
        }
    }
}

#[derive(Debug)]
pub struct LogsView {
    api: ApiClient,
    query: RwLock<LogQuery>,
    state: ViewState<LogPage>,
}

impl LogsView {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            query: RwLock::new(LogQuery::default()),
            state: ViewState::default(),
        }
    }

    #[must_use]
    pub fn query(&self) -> LogQuery {
        self.query.read().clone()
    }

    /// Show `page` filtered by `action`. A changed filter always lands on
    /// page 1.
    pub async fn open(&self, page: Option<u32>, action: Option<String>) {
        let action = action.filter(|a| !a.trim().is_empty());
        {
            let mut query = self.query.write();
            if query.action != action {
                query.action = action;
                query.page = 1;
            } else if let Some(page) = page {
                query.page = page.max(1);
            }
        }
        let ticket = self.state.mount();
        self.refresh(&ticket).await;
    }

    pub fn close(&self) {
        self.state.unmount();
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot<LogPage> {
        self.state.snapshot()
    }

    /// Archive one entry, then re-fetch the current page.
    pub async fn archive(&self, id: &str) -> bool {
        let ticket = self.state.ticket();
        if !permitted(self.api.session(), Action::ArchiveLog) {
            self.state.fail(&ticket, FORBIDDEN_ACTION);
            return false;
        }

        match self.api.logs().archive(id).await {
            Ok(_) => {
                info!(name: "logs.archived", id, "Log entry archived");
                self.refresh(&ticket).await;
                true
            }
            Err(e) => {
                warn!(name: "logs.archive_failed", id, error = %e, "Log archive failed");
                self.state.fail(&ticket, e.user_message(ARCHIVE_FAILED));
                false
            }
        }
    }

    async fn refresh(&self, ticket: &Ticket) {
        if ticket.is_stale() {
            return;
        }
        let LogQuery { page, action } = self.query();
        self.state.begin();
        let result = self
            .api
            .logs()
            .page(page, action.as_deref())
            .await
            .map_err(|e| {
                warn!(name: "logs.load_failed", page, error = %e, "Log page failed");
                e.user_message(LOAD_FAILED)
            });
        if let Ok(loaded) = &result {
            self.query.write().page = loaded.page.max(1);
        }
        self.state.settle(ticket, result);
    }
}
