//! Navigation guard for protected views.

use tracing::{debug, info};

use super::View;
use crate::session::{Role, SessionStore};

/// Outcome of checking one navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session restoration has not finished; show a neutral loading state.
    Pending,
    /// Not a known dashboard view; go to the default view instead.
    Fallback { to: String },
    /// No session; go to the login view and come back to `from` afterwards.
    Login { from: String },
    /// Signed in, but the role may not open this view.
    Forbidden {
        view: View,
        role: Option<Role>,
        redirect_to: String,
    },
    Allow(View),
}

/// Two-checkpoint guard: authenticated, then authorized.
#[derive(Debug, Clone)]
pub struct AuthorizationGuard {
    session: SessionStore,
}

impl AuthorizationGuard {
    #[must_use]
    pub fn new(session: SessionStore) -> Self {
        Self { session }
    }

    /// Decide what a navigation to `path` should do.
    #[must_use]
    pub fn check(&self, path: &str) -> GuardDecision {
        if self.session.is_restoring() {
            debug!(name: "guard.pending", path, "Session restore in flight");
            return GuardDecision::Pending;
        }

        let Some(view) = View::from_path(path) else {
            return GuardDecision::Fallback {
                to: View::DEFAULT.path(),
            };
        };

        let Some(identity) = self.session.identity() else {
            info!(name: "guard.login_required", path, "No session, redirecting to login");
            return GuardDecision::Login {
                from: path.to_string(),
            };
        };

        if !self.session.has_role(view.allowed_roles()) {
            info!(
                name: "guard.forbidden",
                path,
                username = %identity.username,
                role = %identity.effective_role(),
                "Role may not open view"
            );
            return GuardDecision::Forbidden {
                view,
                role: identity.role,
                redirect_to: View::DEFAULT.path(),
            };
        }

        GuardDecision::Allow(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{IDENTITY_KEY, Identity, MemoryStorage, SessionStorage, TOKEN_KEY};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;
    use std::sync::Arc;

    fn signed_in(role: Option<Role>) -> SessionStore {
        let token = encode(
            &Header::default(),
            &json!({"id": "1", "exp": 4_000_000_000_i64}),
            &EncodingKey::from_secret(b"s"),
        )
        .unwrap();
        let identity = Identity {
            id: "1".into(),
            username: "pat".into(),
            role,
        };
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, &token).unwrap();
        storage
            .set(IDENTITY_KEY, &serde_json::to_string(&identity).unwrap())
            .unwrap();
        let store = SessionStore::new(storage);
        store.restore();
        store
    }

    #[test]
    fn test_pending_while_restoring() {
        let store = SessionStore::new(Arc::new(MemoryStorage::new()));
        let guard = AuthorizationGuard::new(store.clone());

        assert_eq!(guard.check("/dashboard/orders"), GuardDecision::Pending);

        store.restore();
        assert_eq!(
            guard.check("/dashboard/orders"),
            GuardDecision::Login {
                from: "/dashboard/orders".into()
            }
        );
    }

    #[test]
    fn test_manager_is_bounced_from_users_but_reaches_orders() {
        let guard = AuthorizationGuard::new(signed_in(Some(Role::Manager)));

        assert_eq!(
            guard.check("/dashboard/users"),
            GuardDecision::Forbidden {
                view: View::Users,
                role: Some(Role::Manager),
                redirect_to: "/dashboard/analytics".into(),
            }
        );
        assert_eq!(
            guard.check("/dashboard/orders"),
            GuardDecision::Allow(View::Orders)
        );
    }

    #[test]
    fn test_every_role_against_every_view() {
        for role in Role::ALL {
            let guard = AuthorizationGuard::new(signed_in(Some(role)));
            for view in View::ALL {
                let allowed = view.allowed_roles().contains(&role);
                let decision = guard.check(&view.path());
                assert_eq!(
                    decision == GuardDecision::Allow(view),
                    allowed,
                    "{role} on {view:?}"
                );
            }
        }
    }

    #[test]
    fn test_unknown_dashboard_path_falls_back() {
        let guard = AuthorizationGuard::new(signed_in(Some(Role::Admin)));
        assert_eq!(
            guard.check("/dashboard/reports"),
            GuardDecision::Fallback {
                to: "/dashboard/analytics".into()
            }
        );
    }

    #[test]
    fn test_roleless_identity_cannot_enter_superadmin_views() {
        let guard = AuthorizationGuard::new(signed_in(None));
        assert!(matches!(
            guard.check("/dashboard/system-logs"),
            GuardDecision::Forbidden { role: None, .. }
        ));
        assert_eq!(
            guard.check("/dashboard/products"),
            GuardDecision::Allow(View::Products)
        );
    }
}
