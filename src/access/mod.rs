//! Role-based access control for dashboard views and in-view actions.
//!
//! The capability tables are static: [`View::allowed_roles`] decides who may
//! open a view, [`Action::allowed_roles`] decides who sees and may trigger an
//! individual action inside a view.

mod guard;

pub use guard::{AuthorizationGuard, GuardDecision};

use crate::session::Role;

/// Public login path.
pub const LOGIN_PATH: &str = "/";
/// Root of the protected path tree.
pub const DASHBOARD_ROOT: &str = "/dashboard";

const STAFF: &[Role] = &[Role::Superadmin, Role::Admin, Role::Manager];
const SUPERADMIN_ONLY: &[Role] = &[Role::Superadmin];

/// A protected dashboard view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Analytics,
    Products,
    Orders,
    Users,
    Monitoring,
    Logs,
}

impl View {
    /// Sidebar order.
    pub const ALL: [View; 6] = [
        View::Analytics,
        View::Products,
        View::Orders,
        View::Users,
        View::Monitoring,
        View::Logs,
    ];

    /// Landing view; open to every role.
    pub const DEFAULT: View = View::Analytics;

    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::Analytics => "analytics",
            Self::Products => "products",
            Self::Orders => "orders",
            Self::Users => "users",
            Self::Monitoring => "system-overview",
            Self::Logs => "system-logs",
        }
    }

    #[must_use]
    pub fn path(self) -> String {
        format!("{DASHBOARD_ROOT}/{}", self.slug())
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Analytics => "Dashboard",
            Self::Products => "Inventory",
            Self::Orders => "Orders",
            Self::Users => "User Management",
            Self::Monitoring => "Health Check",
            Self::Logs => "Security Logs",
        }
    }

    /// Roles allowed to open this view. An empty slice would mean "any
    /// signed-in identity".
    #[must_use]
    pub fn allowed_roles(self) -> &'static [Role] {
        match self {
            Self::Analytics | Self::Products | Self::Orders => STAFF,
            Self::Users | Self::Monitoring | Self::Logs => SUPERADMIN_ONLY,
        }
    }

    /// Resolve a request path (query string ignored) to the view it shows.
    ///
    /// Sub-paths such as `/dashboard/products/42/delete` resolve to their
    /// owning view.
    #[must_use]
    pub fn from_path(path: &str) -> Option<View> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let rest = path.strip_prefix(DASHBOARD_ROOT)?.strip_prefix('/')?;
        let slug = rest.split('/').next().unwrap_or_default();
        Self::ALL.into_iter().find(|v| v.slug() == slug)
    }
}

/// A role-gated action inside a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    EditProduct,
    DeleteProduct,
    UpdateOrderStatus,
    ManageStaff,
    ArchiveLog,
}

impl Action {
    #[must_use]
    pub fn allowed_roles(self) -> &'static [Role] {
        match self {
            Self::EditProduct | Self::UpdateOrderStatus => STAFF,
            Self::DeleteProduct | Self::ManageStaff | Self::ArchiveLog => SUPERADMIN_ONLY,
        }
    }
}

/// Whether `role` is admitted by `allowed` (empty admits everyone).
#[must_use]
pub fn permits(role: Role, allowed: &[Role]) -> bool {
    allowed.is_empty() || allowed.contains(&role)
}

/// Only local dashboard paths are acceptable post-login destinations.
#[must_use]
pub fn sanitize_return_path(from: Option<&str>) -> Option<String> {
    let from = from?.trim();
    let local = from.starts_with('/') && !from.starts_with("//") && !from.contains('\\');
    (local && (from == DASHBOARD_ROOT || from.starts_with("/dashboard/"))).then(|| from.to_string())
}
