//! # Auth API
//!
//! Login, demo login, logout and the current-user profile.

use crate::error::Result;
use crate::fallback;
use crate::http::ApiClient;
use crate::session::storage::{ELEVATED_SESSION_KEY, USER_KEY};
use crate::session::{decode_claims, Credential, Session};
use serde_json::{json, Value};

const DEMO_USER_PATH: &str = "/api/auth/user/";

#[derive(Debug, Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Authenticate and install the resulting session.
    ///
    /// A response with tokens yields a bearer session; a response without them
    /// means the server tracks the login in its session cookie.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let endpoint = self.client.config().endpoints().login.clone();
        let response = self
            .client
            .post(
                &endpoint,
                json!({ "username": username, "password": password }),
            )
            .await?;
        let body = response.json_value()?;

        let access = string_field(&body, &["access", "access_token", "token"]);
        let refresh = string_field(&body, &["refresh", "refresh_token"]);

        let mut session = match access {
            Some(access) => Session::with_tokens(access, refresh),
            None => Session::cookie_based(),
        };

        let user = body
            .get("user")
            .filter(|user| user.is_object())
            .cloned()
            .or_else(|| session.access.bearer().and_then(decode_claims));
        if let Some(user) = user {
            session = session.with_user(user);
        }

        self.client.start_session(session.clone())?;
        if is_superuser(session.user.as_ref()) {
            tracing::info!("Elevated session detected for {username}");
            self.client.storage().set(ELEVATED_SESSION_KEY, "true")?;
        }
        Ok(session)
    }

    /// Install an offline demo session; no request is made
    pub fn demo_login(&self) -> Result<Session> {
        let mut session = Session::demo();
        if let Some(user) = fallback::lookup(DEMO_USER_PATH) {
            session = session.with_user(user.clone());
        }
        self.client.start_session(session.clone())?;
        Ok(session)
    }

    /// Tell the server (best-effort) and drop all local session state
    pub async fn logout(&self) -> Result<()> {
        let session = self.client.session_store().session();
        if !matches!(session.access, Credential::Demo | Credential::None) {
            let endpoint = self.client.config().endpoints().logout.clone();
            let body = match session.refresh {
                Some(refresh) => json!({ "refresh": refresh }),
                None => json!({}),
            };
            if let Err(e) = self.client.post(&endpoint, body).await {
                tracing::warn!("Server logout failed, clearing local session anyway: {e}");
            }
        }
        self.client.end_session()
    }

    /// Fetch the signed-in user's profile and cache it.
    ///
    /// Demo payloads are returned as-is and never cached.
    pub async fn current_user(&self) -> Result<Value> {
        let endpoint = self.client.config().endpoints().current_user.clone();
        let response = self.client.get(&endpoint).await?;
        let user = response.json_value()?;
        if response.is_synthetic() {
            tracing::debug!("Profile request answered with demo data, not caching it");
            return Ok(user);
        }

        let store = self.client.session_store();
        store.set_session(store.session().with_user(user.clone()));
        self.client.storage().set(USER_KEY, &user.to_string())?;
        Ok(user)
    }

    /// Profile cached by the last login or [`Self::current_user`] call
    pub fn cached_user(&self) -> Option<Value> {
        self.client.session_store().session().user.or_else(|| {
            self.client
                .storage()
                .get(USER_KEY)
                .and_then(|raw| serde_json::from_str(&raw).ok())
        })
    }
}

fn string_field(body: &Value, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| body.get(name).and_then(Value::as_str))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn is_superuser(user: Option<&Value>) -> bool {
    user.and_then(|user| user.get("is_superuser"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}
