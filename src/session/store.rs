//! The session store: the single source of truth for who is signed in.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::identity::{Identity, Role, Session};
use super::storage::{IDENTITY_KEY, SessionStorage, StorageError, TOKEN_KEY};
use super::token;
use crate::access::permits;
use crate::api::{ApiError, UNREACHABLE};

/// Capacity of the session event channel. Slow subscribers lose the oldest events.
const EVENT_CAPACITY: usize = 32;

/// Fallback shown when the backend rejects a login without a message.
pub const LOGIN_FAILED: &str = "Login failed. Please try again.";

/// Username/password pair sent to the login endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Successful login response: `{ token, admin }`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginGrant {
    pub token: String,
    pub admin: Identity,
}

/// Anything able to exchange credentials for a [`LoginGrant`].
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<LoginGrant, ApiError>;
}

#[derive(Error, Debug)]
pub enum AuthError {
    /// The backend refused the credentials or could not be reached.
    #[error("{message}")]
    Rejected {
        message: String,
        #[source]
        source: ApiError,
    },

    /// The session was granted but could not be persisted.
    #[error("failed to persist session: {0}")]
    Storage(#[from] StorageError),
}

impl AuthError {
    fn rejected(source: ApiError) -> Self {
        let message = match &source {
            ApiError::Transport(_) => UNREACHABLE.to_string(),
            other => other
                .backend_message()
                .map_or_else(|| LOGIN_FAILED.to_string(), ToString::to_string),
        };
        Self::Rejected { message, source }
    }

    /// Text suitable for showing next to the login form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::Storage(_) => LOGIN_FAILED.to_string(),
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Logout,
    Expired,
    Unauthorized,
    Corrupt,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Logout => "logout",
            Self::Expired => "expired",
            Self::Unauthorized => "unauthorized",
            Self::Corrupt => "corrupt",
        })
    }
}

/// Signals published to [`SessionStore::subscribe`] receivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(Identity),
    Restored(Identity),
    Ended(EndReason),
}

/// Result of [`SessionStore::restore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Nothing (or only half a session) was persisted.
    Empty,
    Restored(Identity),
    /// The persisted token had expired; storage was cleared.
    Expired,
    /// The persisted token or identity could not be read; storage was cleared.
    Corrupt,
}

/// Authentication state as seen by views and the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Persisted state has not been examined yet.
    Restoring,
    SignedOut,
    SignedIn(Session),
}

/// Shared, cloneable handle to the operator's session.
///
/// The store never navigates. It mutates state, persists it, and publishes
/// [`SessionEvent`]s; redirects are decided by whoever subscribes.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

#[derive(Debug)]
struct SessionStoreInner {
    storage: Arc<dyn SessionStorage>,
    state: RwLock<AuthState>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    /// Create a store in the [`AuthState::Restoring`] state.
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(SessionStoreInner {
                storage,
                state: RwLock::new(AuthState::Restoring),
                events,
            }),
        }
    }

    /// Receive every [`SessionEvent`] published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        self.inner.state.read().clone()
    }

    /// True until [`restore`](Self::restore) has run.
    #[must_use]
    pub fn is_restoring(&self) -> bool {
        matches!(*self.inner.state.read(), AuthState::Restoring)
    }

    #[must_use]
    pub fn session(&self) -> Option<Session> {
        match &*self.inner.state.read() {
            AuthState::SignedIn(session) => Some(session.clone()),
            _ => None,
        }
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.session().map(|s| s.identity)
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.session().map(|s| s.token)
    }

    /// Whether the current identity may do something open to `allowed`.
    ///
    /// An empty `allowed` set admits any signed-in identity. Without an
    /// identity the answer is always `false`.
    #[must_use]
    pub fn has_role(&self, allowed: &[Role]) -> bool {
        match &*self.inner.state.read() {
            AuthState::SignedIn(session) => permits(session.identity.effective_role(), allowed),
            _ => false,
        }
    }

    /// Rehydrate the session persisted by a previous run.
    pub fn restore(&self) -> RestoreOutcome {
        self.restore_at(Utc::now().timestamp())
    }

    /// [`restore`](Self::restore) with an explicit clock (UNIX seconds).
    pub fn restore_at(&self, now: i64) -> RestoreOutcome {
        let storage = &self.inner.storage;
        let (token, raw_identity) = match (storage.get(TOKEN_KEY), storage.get(IDENTITY_KEY)) {
            (Ok(Some(token)), Ok(Some(identity))) => (token, identity),
            (Ok(_), Ok(_)) => {
                *self.inner.state.write() = AuthState::SignedOut;
                info!(name: "session.restore.empty", "No persisted session");
                return RestoreOutcome::Empty;
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(name: "session.restore.unreadable", error = %e, "Persisted session unreadable");
                self.discard(EndReason::Corrupt);
                return RestoreOutcome::Corrupt;
            }
        };

        let claims = match token::inspect(&token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!(name: "session.restore.bad_token", error = %e, "Persisted token undecodable");
                self.discard(EndReason::Corrupt);
                return RestoreOutcome::Corrupt;
            }
        };

        let identity: Identity = match serde_json::from_str(&raw_identity) {
            Ok(identity) => identity,
            Err(e) => {
                warn!(name: "session.restore.bad_identity", error = %e, "Persisted identity undecodable");
                self.discard(EndReason::Corrupt);
                return RestoreOutcome::Corrupt;
            }
        };

        if claims.is_expired_at(now) {
            info!(
                name: "session.restore.expired",
                username = %identity.username,
                "Persisted session expired"
            );
            self.discard(EndReason::Expired);
            return RestoreOutcome::Expired;
        }

        *self.inner.state.write() = AuthState::SignedIn(Session {
            token,
            identity: identity.clone(),
        });
        info!(
            name: "session.restored",
            username = %identity.username,
            role = %identity.effective_role(),
            "Session restored"
        );
        let _ = self.inner.events.send(SessionEvent::Restored(identity.clone()));
        RestoreOutcome::Restored(identity)
    }

    /// Exchange credentials for a session.
    ///
    /// On failure neither memory nor storage is touched.
    pub async fn login<B>(
        &self,
        backend: &B,
        username: &str,
        password: &str,
    ) -> Result<Session, AuthError>
    where
        B: AuthBackend + ?Sized,
    {
        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };

        let grant = match backend.authenticate(&credentials).await {
            Ok(grant) => grant,
            Err(e) => {
                warn!(name: "session.login.rejected", username = %username, error = %e, "Login rejected");
                return Err(AuthError::rejected(e));
            }
        };

        let session = Session {
            token: grant.token.clone(),
            identity: grant.admin.clone(),
        };
        {
            // Storage and memory change under one write lock so a concurrent
            // logout cannot clear the file between the two.
            let mut state = self.inner.state.write();
            self.persist(&grant)?;
            *state = AuthState::SignedIn(session.clone());
        }
        info!(
            name: "session.signed_in",
            username = %session.identity.username,
            role = %session.identity.effective_role(),
            "Signed in"
        );
        let _ = self
            .inner
            .events
            .send(SessionEvent::SignedIn(session.identity.clone()));
        Ok(session)
    }

    /// Forget the session everywhere. Safe to call repeatedly.
    pub fn logout(&self) {
        let previous = {
            let mut state = self.inner.state.write();
            let previous = std::mem::replace(&mut *state, AuthState::SignedOut);
            self.clear_storage();
            previous
        };
        if let AuthState::SignedIn(session) = previous {
            info!(name: "session.logout", username = %session.identity.username, "Signed out");
            let _ = self.inner.events.send(SessionEvent::Ended(EndReason::Logout));
        }
    }

    /// End the session only if `token` is still the current one.
    ///
    /// Returns `true` when this call ended the session. A rejection of a
    /// token that was already replaced or cleared is ignored.
    pub fn end_if_current(&self, token: &str, reason: EndReason) -> bool {
        {
            let mut state = self.inner.state.write();
            match &*state {
                AuthState::SignedIn(session) if session.token == token => {
                    *state = AuthState::SignedOut;
                }
                _ => return false,
            }
            self.clear_storage();
        }
        warn!(name: "session.ended", reason = %reason, "Session ended");
        let _ = self.inner.events.send(SessionEvent::Ended(reason));
        true
    }

    fn discard(&self, reason: EndReason) {
        {
            let mut state = self.inner.state.write();
            *state = AuthState::SignedOut;
            self.clear_storage();
        }
        let _ = self.inner.events.send(SessionEvent::Ended(reason));
    }

    fn persist(&self, grant: &LoginGrant) -> Result<(), StorageError> {
        let identity = serde_json::to_string(&grant.admin)?;
        let storage = &self.inner.storage;
        let written = storage
            .set(TOKEN_KEY, &grant.token)
            .and_then(|()| storage.set(IDENTITY_KEY, &identity));
        if let Err(e) = written {
            self.clear_storage();
            return Err(e);
        }
        Ok(())
    }

    fn clear_storage(&self) {
        for key in [TOKEN_KEY, IDENTITY_KEY] {
            if let Err(e) = self.inner.storage.remove(key) {
                warn!(name: "session.storage.clear_failed", key, error = %e, "Failed to clear session key");
            }
        }
    }
}
