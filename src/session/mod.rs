//! Operator session: token lifecycle, persistence and role checks.
//!
//! # Architecture
//!
//! - [`SessionStore`]: shared handle holding the current [`Session`]
//! - [`SessionStorage`]: durable key/value storage the store persists into
//! - [`token`]: reads the `exp` claim of bearer tokens
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use hov_admin::session::{MemoryStorage, RestoreOutcome, SessionStore};
//!
//! let store = SessionStore::new(Arc::new(MemoryStorage::new()));
//! assert!(store.is_restoring());
//!
//! assert_eq!(store.restore(), RestoreOutcome::Empty);
//! assert!(!store.has_role(&[]));
//! ```

mod identity;
mod storage;
mod store;
pub mod token;

pub use identity::{Identity, Role, Session, UnknownRole};
pub use storage::{
    FileStorage, IDENTITY_KEY, MemoryStorage, SessionStorage, StorageError, TOKEN_KEY,
};
pub use store::{
    AuthBackend, AuthError, AuthState, Credentials, EndReason, LOGIN_FAILED, LoginGrant,
    RestoreOutcome, SessionEvent, SessionStore,
};
