//! Per-view state cell with mount tracking.

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Proof that a fetch was started under a particular mount.
///
/// Once the view is remounted or unmounted the ticket goes stale and any
/// result delivered with it is dropped.
#[derive(Debug, Clone)]
pub struct Ticket(CancellationToken);

impl Ticket {
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.0.is_cancelled()
    }
}

/// Point-in-time copy of a [`ViewState`], handed to renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
struct Cell<T> {
    data: T,
    loading: bool,
    error: Option<String>,
    mount: CancellationToken,
}

/// `data`, `loading` and inline `error` for one view.
#[derive(Debug)]
pub struct ViewState<T> {
    cell: RwLock<Cell<T>>,
}

impl<T: Default> Default for ViewState<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> ViewState<T> {
    pub fn new(initial: T) -> Self {
        Self {
            cell: RwLock::new(Cell {
                data: initial,
                loading: false,
                error: None,
                mount: CancellationToken::new(),
            }),
        }
    }

    /// Start a fresh mount. Fetches begun under earlier mounts go stale.
    pub fn mount(&self) -> Ticket {
        let mut cell = self.cell.write();
        cell.mount.cancel();
        cell.mount = CancellationToken::new();
        Ticket(cell.mount.clone())
    }

    /// Tear the view down; in-flight fetches will not write back.
    pub fn unmount(&self) {
        self.cell.write().mount.cancel();
    }

    /// Ticket for the current mount, without starting a load.
    pub fn ticket(&self) -> Ticket {
        Ticket(self.cell.read().mount.clone())
    }

    /// Mark a fetch as started and clear the previous error.
    pub fn begin(&self) -> Ticket {
        let mut cell = self.cell.write();
        cell.loading = true;
        cell.error = None;
        Ticket(cell.mount.clone())
    }

    /// Deliver a fetch result. Returns `false` when the ticket was stale and
    /// nothing changed.
    pub fn settle(&self, ticket: &Ticket, result: Result<T, String>) -> bool {
        if ticket.is_stale() {
            debug!(name: "view.result_discarded", "Dropping result for a torn-down view");
            return false;
        }
        let mut cell = self.cell.write();
        cell.loading = false;
        match result {
            Ok(data) => {
                cell.data = data;
                cell.error = None;
            }
            Err(message) => cell.error = Some(message),
        }
        true
    }

    /// Patch the data in place, e.g. after a confirmed mutation.
    pub fn update(&self, ticket: &Ticket, patch: impl FnOnce(&mut T)) -> bool {
        if ticket.is_stale() {
            return false;
        }
        patch(&mut self.cell.write().data);
        true
    }

    /// Show an inline error without touching the data.
    pub fn fail(&self, ticket: &Ticket, message: impl Into<String>) -> bool {
        if ticket.is_stale() {
            return false;
        }
        let mut cell = self.cell.write();
        cell.loading = false;
        cell.error = Some(message.into());
        true
    }

    pub fn clear_error(&self) {
        self.cell.write().error = None;
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.cell.read().error.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.cell.read().loading
    }
}

impl<T: Clone> ViewState<T> {
    #[must_use]
    pub fn snapshot(&self) -> Snapshot<T> {
        let cell = self.cell.read();
        Snapshot {
            data: cell.data.clone(),
            loading: cell.loading,
            error: cell.error.clone(),
        }
    }

    #[must_use]
    pub fn data(&self) -> T {
        self.cell.read().data.clone()
    }
}
