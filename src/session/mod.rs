//! # Session Layer
//!
//! Credentials, in-process session state and persisted storage, plus the
//! events broadcast when a session ends.

pub mod credential;
pub mod storage;
pub mod store;

pub use credential::{decode_claims, Credential, DEMO_SENTINEL, SESSION_AUTH_SENTINEL};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::{MemorySessionStore, Session, SessionStore};

/// Session lifecycle notifications delivered to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Credentials were replaced by a successful refresh
    Refreshed,
    /// Session state was cleared; the application should return to login
    LoggedOut,
}
