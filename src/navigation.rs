//! Redirect bookkeeping driven by session events.
//!
//! The [`SessionStore`] only announces that a session ended; the
//! [`Navigator`] turns that into at most one redirect to the login view,
//! unless the operator is already there.

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};
use url::form_urlencoded;

use crate::access::{LOGIN_PATH, View, sanitize_return_path};
use crate::session::{SessionEvent, SessionStore};

/// A navigation the next response should perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub location: String,
}

impl Redirect {
    /// Login view, remembering where to come back to.
    #[must_use]
    pub fn to_login(from: &str) -> Self {
        let location = match sanitize_return_path(Some(from)) {
            Some(from) => {
                let query: String = form_urlencoded::Serializer::new(String::new())
                    .append_pair("from", &from)
                    .finish();
                format!("{LOGIN_PATH}?{query}")
            }
            None => LOGIN_PATH.to_string(),
        };
        Self { location }
    }

    /// Where to land after a successful login.
    #[must_use]
    pub fn after_login(from: Option<&str>) -> Self {
        Self {
            location: sanitize_return_path(from).unwrap_or_else(|| View::DEFAULT.path()),
        }
    }
}

#[derive(Debug)]
struct Position {
    location: String,
    pending: Option<Redirect>,
}

/// Tracks the operator's location and the redirect owed to them.
#[derive(Debug)]
pub struct Navigator {
    events: Mutex<broadcast::Receiver<SessionEvent>>,
    position: RwLock<Position>,
}

impl Navigator {
    /// Subscribe to `session`. Events published before this call are not seen.
    #[must_use]
    pub fn new(session: &SessionStore) -> Self {
        Self {
            events: Mutex::new(session.subscribe()),
            position: RwLock::new(Position {
                location: LOGIN_PATH.to_string(),
                pending: None,
            }),
        }
    }

    /// Record that the operator is now looking at `path`.
    pub fn visit(&self, path: &str) {
        self.drain();
        self.position.write().location = path.to_string();
    }

    #[must_use]
    pub fn location(&self) -> String {
        self.position.read().location.clone()
    }

    /// The redirect owed to the operator, if any. Taking it clears it.
    pub fn take_redirect(&self) -> Option<Redirect> {
        self.drain();
        self.position.write().pending.take()
    }

    fn drain(&self) {
        let mut events = self.events.lock();
        loop {
            match events.try_recv() {
                Ok(SessionEvent::Ended(reason)) => {
                    let mut position = self.position.write();
                    if position.location == LOGIN_PATH || position.pending.is_some() {
                        debug!(name: "navigator.redirect_skipped", reason = %reason, "No redirect needed");
                        continue;
                    }
                    let redirect = Redirect::to_login(&position.location);
                    info!(
                        name: "navigator.redirect_scheduled",
                        reason = %reason,
                        to = %redirect.location,
                        "Session ended, returning to login"
                    );
                    position.pending = Some(redirect);
                }
                Ok(SessionEvent::SignedIn(_)) => {
                    self.position.write().pending = None;
                }
                Ok(SessionEvent::Restored(_)) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(name: "navigator.events_lagged", skipped, "Dropped session events");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }
}
