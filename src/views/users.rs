//! User management: staff accounts and shopper accounts, one tab each.

use std::fmt;
use std::str::FromStr;

use parking_lot::RwLock;
use tracing::{info, warn};

use super::state::{Snapshot, ViewState};
use super::{FORBIDDEN_ACTION, permitted};
use crate::access::Action;
use crate::api::ApiClient;
use crate::api::types::{AdminUser, Customer, NewAdmin};

pub const CREATE_FAILED: &str = "Failed to create user.";
pub const DELETE_FAILED: &str = "Failed to delete user.";
pub const SUPERADMIN_PROTECTED: &str = "Cannot delete another superadmin.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Team,
    Customers,
}

impl Tab {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Customers => "customers",
        }
    }

    fn load_failed(self) -> String {
        format!("Failed to load {}. Please try again.", self.as_str())
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "team" => Ok(Self::Team),
            "customers" => Ok(Self::Customers),
            other => Err(format!("unknown users tab: {other}")),
        }
    }
}

#[derive(Debug)]
pub struct UsersView {
    api: ApiClient,
    tab: RwLock<Tab>,
    team: ViewState<Vec<AdminUser>>,
    customers: ViewState<Vec<Customer>>,
}

impl UsersView {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            tab: RwLock::new(Tab::default()),
            team: ViewState::default(),
            customers: ViewState::default(),
        }
    }

    #[must_use]
    pub fn tab(&self) -> Tab {
        *self.tab.read()
    }

    /// Switch to `tab` and fetch its list. The other tab is torn down.
    pub async fn open(&self, tab: Tab) {
        *self.tab.write() = tab;
        match tab {
            Tab::Team => {
                self.customers.unmount();
                self.team.mount();
                let ticket = self.team.begin();
                let result = self.api.staff().list().await.map_err(|e| {
                    warn!(name: "users.load_failed", tab = %tab, error = %e, "User list failed");
                    tab.load_failed()
                });
                self.team.settle(&ticket, result);
            }
            Tab::Customers => {
                self.team.unmount();
                self.customers.mount();
                let ticket = self.customers.begin();
                let result = self.api.customers().list().await.map_err(|e| {
                    warn!(name: "users.load_failed", tab = %tab, error = %e, "User list failed");
                    tab.load_failed()
                });
                self.customers.settle(&ticket, result);
            }
        }
    }

    pub fn close(&self) {
        self.team.unmount();
        self.customers.unmount();
    }

    #[must_use]
    pub fn team(&self) -> Snapshot<Vec<AdminUser>> {
        self.team.snapshot()
    }

    #[must_use]
    pub fn customers(&self) -> Snapshot<Vec<Customer>> {
        self.customers.snapshot()
    }

    /// Register a staff account and append it to the team list.
    pub async fn create(&self, admin: &NewAdmin) -> bool {
        let ticket = self.team.ticket();
        if !permitted(self.api.session(), Action::ManageStaff) {
            self.team.fail(&ticket, FORBIDDEN_ACTION);
            return false;
        }

        match self.api.staff().register(admin).await {
            Ok(created) => {
                info!(
                    name: "users.created",
                    username = %created.username,
                    role = %admin.role,
                    "Staff account created"
                );
                self.team.clear_error();
                self.team.update(&ticket, |team| team.push(created));
                true
            }
            Err(e) => {
                warn!(name: "users.create_failed", username = %admin.username, error = %e, "Staff account creation failed");
                self.team.fail(&ticket, e.user_message(CREATE_FAILED));
                false
            }
        }
    }

    /// Delete an account listed on `tab` and drop it from that tab's list.
    pub async fn delete(&self, tab: Tab, id: &str) -> bool {
        match tab {
            Tab::Team => self.delete_staff(id).await,
            Tab::Customers => self.delete_customer(id).await,
        }
    }

    async fn delete_staff(&self, id: &str) -> bool {
        let ticket = self.team.ticket();
        if !permitted(self.api.session(), Action::ManageStaff) {
            self.team.fail(&ticket, FORBIDDEN_ACTION);
            return false;
        }
        let protected = self
            .team
            .data()
            .iter()
            .any(|u| u.id == id && u.is_superadmin());
        if protected {
            self.team.fail(&ticket, SUPERADMIN_PROTECTED);
            return false;
        }

        match self.api.staff().delete(id).await {
            Ok(()) => {
                info!(name: "users.staff_deleted", id, "Staff account deleted");
                self.team.clear_error();
                self.team.update(&ticket, |team| team.retain(|u| u.id != id));
                true
            }
            Err(e) => {
                warn!(name: "users.delete_failed", id, error = %e, "Staff account delete failed");
                self.team.fail(&ticket, DELETE_FAILED);
                false
            }
        }
    }

    async fn delete_customer(&self, id: &str) -> bool {
        let ticket = self.customers.ticket();
        if !permitted(self.api.session(), Action::ManageStaff) {
            self.customers.fail(&ticket, FORBIDDEN_ACTION);
            return false;
        }

        match self.api.customers().delete(id).await {
            Ok(()) => {
                info!(name: "users.customer_deleted", id, "Customer account deleted");
                self.customers.clear_error();
                self.customers
                    .update(&ticket, |customers| customers.retain(|c| c.id != id));
                true
            }
            Err(e) => {
                warn!(name: "users.delete_failed", id, error = %e, "Customer delete failed");
                self.customers.fail(&ticket, DELETE_FAILED);
                false
            }
        }
    }
}
