//! Inventory: list, create, edit and delete products.

use tracing::{info, warn};

use super::state::{Snapshot, Ticket, ViewState};
use super::{FORBIDDEN_ACTION, permitted};
use crate::access::Action;
use crate::api::ApiClient;
use crate::api::types::{Product, ProductDraft};

pub const LOAD_FAILED: &str = "Failed to load products. Please try again.";
pub const SAVE_FAILED: &str = "Operation failed.";
pub const DELETE_FAILED: &str = "Failed to delete product.";

#[derive(Debug)]
pub struct ProductsView {
    api: ApiClient,
    state: ViewState<Vec<Product>>,
}

impl ProductsView {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: ViewState::default(),
        }
    }

    /// Mount the view and fetch the catalog.
    pub async fn open(&self) {
        let ticket = self.state.mount();
        self.refresh(&ticket).await;
    }

    pub fn close(&self) {
        self.state.unmount();
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot<Vec<Product>> {
        self.state.snapshot()
    }

    /// Create (`id` = `None`) or update a product, then re-fetch.
    pub async fn save(&self, id: Option<&str>, draft: &ProductDraft) -> bool {
        let ticket = self.state.ticket();
        if !permitted(self.api.session(), Action::EditProduct) {
            self.state.fail(&ticket, FORBIDDEN_ACTION);
            return false;
        }

        let result = match id {
            Some(id) => self.api.products().update(id, draft).await,
            None => self.api.products().create(draft).await,
        };
        match result {
            Ok(_) => {
                info!(name: "products.saved", id = id.unwrap_or("new"), product = %draft.name, "Product saved");
                self.refresh(&ticket).await;
                true
            }
            Err(e) => {
                warn!(name: "products.save_failed", error = %e, "Product save failed");
                self.state.fail(&ticket, e.user_message(SAVE_FAILED));
                false
            }
        }
    }

    /// Refuse a submitted product form that could not be read, keeping the
    /// catalog as it is.
    pub fn reject(&self, message: &str) {
        let ticket = self.state.ticket();
        if permitted(self.api.session(), Action::EditProduct) {
            self.state.fail(&ticket, message);
        } else {
            self.state.fail(&ticket, FORBIDDEN_ACTION);
        }
    }

    /// Delete a product, then re-fetch. On failure the list is left alone.
    pub async fn delete(&self, id: &str) -> bool {
        let ticket = self.state.ticket();
        if !permitted(self.api.session(), Action::DeleteProduct) {
            self.state.fail(&ticket, FORBIDDEN_ACTION);
            return false;
        }

        match self.api.products().delete(id).await {
            Ok(()) => {
                info!(name: "products.deleted", id, "Product deleted");
                self.refresh(&ticket).await;
                true
            }
            Err(e) => {
                warn!(name: "products.delete_failed", id, error = %e, "Product delete failed");
                self.state.fail(&ticket, DELETE_FAILED);
                false
            }
        }
    }

    async fn refresh(&self, ticket: &Ticket) {
        if ticket.is_stale() {
            return;
        }
        self.state.begin();
        let result = self.api.products().list().await.map_err(|e| {
            warn!(name: "products.load_failed", error = %e, "Product list failed");
            LOAD_FAILED.to_string()
        });
        self.state.settle(ticket, result);
    }
}
