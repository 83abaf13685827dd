//! Orders: list and move orders through their lifecycle.

use tracing::{info, warn};

use super::state::{Snapshot, ViewState};
use super::{FORBIDDEN_ACTION, permitted};
use crate::access::Action;
use crate::api::ApiClient;
use crate::api::types::{Order, OrderStatus};

pub const LOAD_FAILED: &str = "Failed to load orders. Please try again.";
pub const UPDATE_FAILED: &str = "Failed to update order status.";

#[derive(Debug)]
pub struct OrdersView {
    api: ApiClient,
    state: ViewState<Vec<Order>>,
}

impl OrdersView {
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
        let result = self.api.orders().list().await.map_err(|e| {
            warn!(name: "orders.load_failed", error = %e, "Order list failed");
            LOAD_FAILED.to_string()
        });
        self.state.settle(&ticket, result);
    }

    pub fn close(&self) {
        self.state.unmount();
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot<Vec<Order>> {
        self.state.snapshot()
    }

    /// Persist a new status, then patch only that order locally.
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> bool {
        let ticket = self.state.ticket();
        if !permitted(self.api.session(), Action::UpdateOrderStatus) {
            self.state.fail(&ticket, FORBIDDEN_ACTION);
            return false;
        }

        if let Err(e) = self.api.orders().set_status(id, status).await {
            warn!(name: "orders.update_failed", id, status = %status, error = %e, "Order status update failed");
            self.state.fail(&ticket, UPDATE_FAILED);
            return false;
        }

        info!(name: "orders.status_updated", id, status = %status, "Order status updated");
        self.state.clear_error();
        self.state.update(&ticket, |orders| {
            for order in orders.iter_mut().filter(|o| o.id == id) {
                order.status = status.as_str().to_string();
            }
        });
        true
    }
}
