//! # Session Store
//!
//! The in-process session state the HTTP layer reads from. It is injected into
//! [`crate::ApiClient`] so tests and embedders can provide their own.

use super::credential::Credential;
use super::storage::{Storage, ACCESS_TOKEN_KEY, LEGACY_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY};
use serde_json::Value;
use std::sync::RwLock;

/// Authentication state of the current user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub access: Credential,
    pub refresh: Option<String>,
    pub user: Option<Value>,
}

impl Session {
    /// Session authenticated with a bearer/refresh token pair
    pub fn with_tokens(access: impl Into<String>, refresh: Option<String>) -> Self {
        Self {
            access: Credential::Jwt(access.into()),
            refresh,
            user: None,
        }
    }

    /// Session authenticated by the server's session cookie
    pub fn cookie_based() -> Self {
        Self {
            access: Credential::SessionCookie,
            ..Self::default()
        }
    }

    pub fn demo() -> Self {
        Self {
            access: Credential::Demo,
            ..Self::default()
        }
    }

    /// Rebuild a session from persisted storage
    pub fn restore(storage: &dyn Storage) -> Self {
        let access = storage
            .get(ACCESS_TOKEN_KEY)
            .or_else(|| storage.get(LEGACY_TOKEN_KEY));
        Self {
            access: Credential::from_raw(access.as_deref()),
            refresh: storage.get(REFRESH_TOKEN_KEY).filter(|r| !r.is_empty()),
            user: storage
                .get(USER_KEY)
                .and_then(|raw| serde_json::from_str(&raw).ok()),
        }
    }

    pub fn with_user(mut self, user: Value) -> Self {
        self.user = Some(user);
        self
    }

    pub fn is_demo(&self) -> bool {
        self.access == Credential::Demo
    }

    pub fn is_authenticated(&self) -> bool {
        self.access.is_present()
    }

    /// Refresh token usable against the refresh endpoint.
    ///
    /// Sentinel values never qualify: cookie sessions are refreshed by the server.
    pub fn usable_refresh(&self) -> Option<&str> {
        match Credential::from_raw(self.refresh.as_deref()) {
            Credential::Jwt(_) => self.refresh.as_deref().map(str::trim),
            _ => None,
        }
    }
}

/// Read/mutate port for session state
pub trait SessionStore: Send + Sync {
    fn session(&self) -> Session;

    fn set_session(&self, session: Session);

    /// Apply a successful refresh; a `None` refresh keeps the current one
    fn update_tokens(&self, access: String, refresh: Option<String>);

    fn clear(&self);
}

/// Default [`SessionStore`] holding the session behind a lock
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: RwLock<Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            inner: RwLock::new(session),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn session(&self) -> Session {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_session(&self, session: Session) {
        match self.inner.write() {
            Ok(mut guard) => *guard = session,
            Err(poisoned) => *poisoned.into_inner() = session,
        }
    }

    fn update_tokens(&self, access: String, refresh: Option<String>) {
        let mut session = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        session.access = Credential::Jwt(access);
        if refresh.is_some() {
            session.refresh = refresh;
        }
    }

    fn clear(&self) {
        self.set_session(Session::default());
    }
}
