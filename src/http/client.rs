//! # API Client
//!
//! Every request passes through the same pipeline:
//!
//! ```text
//! execute ──▶ dispatch (CSRF + bearer) ──▶ 2xx ──▶ caller
//!                                       │
//!                                       └──▶ recover
//!                                             ├─ demo payload (404/401, first attempt)
//!                                             ├─ subscription tag (401)
//!                                             ├─ refresh once, re-dispatch (401, first attempt)
//!                                             └─ propagate
//! ```

use super::config::ClientConfig;
use super::csrf::CsrfResolver;
use super::refresh::{self, RefreshState};
use super::request::RequestDescriptor;
use super::response::ApiResponse;
use crate::error::{ApiError, Result};
use crate::fallback;
use crate::session::storage::{
    ACCESS_TOKEN_KEY, COOKIES_KEY, ELEVATED_SESSION_KEY, LEGACY_TOKEN_KEY, REFRESH_TOKEN_KEY,
    USER_KEY,
};
use crate::session::{
    Credential, MemorySessionStore, MemoryStorage, Session, SessionEvent, SessionStore, Storage,
};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Capacity of the session event channel
const EVENT_CAPACITY: usize = 16;

/// Builder for [`ApiClient`] with injectable session state
pub struct ApiClientBuilder {
    config: ClientConfig,
    store: Option<Arc<dyn SessionStore>>,
    storage: Option<Arc<dyn Storage>>,
    route: String,
}

impl ApiClientBuilder {
    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Route the application is showing when the client is created
    pub fn current_route(mut self, route: impl Into<String>) -> Self {
        self.route = route.into();
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let jar = Arc::new(Jar::default());
        let http = self.config.build_http_client(jar.clone())?;
        let csrf = CsrfResolver::new(&self.config)?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let store: Arc<dyn SessionStore> = match self.store {
            Some(store) => store,
            None => Arc::new(MemorySessionStore::new()),
        };
        let storage: Arc<dyn Storage> = match self.storage {
            Some(storage) => storage,
            None => Arc::new(MemoryStorage::new()),
        };
        if let Some(cookies) = storage.get(COOKIES_KEY) {
            restore_cookies(&jar, self.config.base_url(), &cookies);
        }

        Ok(ApiClient {
            inner: Arc::new(ClientInner {
                http,
                jar,
                csrf,
                store,
                storage,
                events,
                route: RwLock::new(self.route),
                config: self.config,
            }),
        })
    }
}

struct ClientInner {
    config: ClientConfig,
    http: reqwest::Client,
    jar: Arc<Jar>,
    csrf: CsrfResolver,
    store: Arc<dyn SessionStore>,
    storage: Arc<dyn Storage>,
    events: broadcast::Sender<SessionEvent>,
    route: RwLock<String>,
}

/// Session-aware REST client. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.config.base_url().as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Client with in-memory session state
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: ClientConfig) -> ApiClientBuilder {
        ApiClientBuilder {
            config,
            store: None,
            storage: None,
            route: "/".to_string(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn session_store(&self) -> &Arc<dyn SessionStore> {
        &self.inner.store
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.inner.storage
    }

    /// Cookies shared by every request this client makes
    pub fn cookie_jar(&self) -> &Jar {
        &self.inner.jar
    }

    /// Receive session lifecycle events (logout, refresh)
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Record the route the application is currently showing
    pub fn set_current_route(&self, route: impl Into<String>) {
        let route = route.into();
        match self.inner.route.write() {
            Ok(mut guard) => *guard = route,
            Err(poisoned) => *poisoned.into_inner() = route,
        }
    }

    pub fn current_route(&self) -> String {
        match self.inner.route.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.execute(RequestDescriptor::get(path)).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.execute(RequestDescriptor::post(path, body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.execute(RequestDescriptor::put(path, body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.execute(RequestDescriptor::patch(path, body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.execute(RequestDescriptor::delete(path)).await
    }

    /// Run a request through the full interceptor pipeline
    pub async fn execute(&self, request: RequestDescriptor) -> Result<ApiResponse> {
        let response = self.dispatch(&request).await?;
        if response.is_success() {
            return Ok(response);
        }
        self.recover(request, response).await
    }

    /// Attach CSRF and bearer headers, then send
    async fn dispatch(&self, request: &RequestDescriptor) -> Result<ApiResponse> {
        let inner = &self.inner;
        let url = inner.config.url_for(request.path())?;
        tracing::debug!(
            "{} {} (attempt {})",
            request.method(),
            url,
            request.attempt()
        );

        let mut builder = inner.http.request(request.method().clone(), url);
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(token) = inner.csrf.resolve(&inner.http, &inner.jar).await {
            builder = builder.header(inner.config.csrf_header(), token);
        }

        let credential = self.access_credential();
        if let Some(token) = credential.bearer() {
            builder = builder.bearer_auth(token);
        }

        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!("Request to {} failed: {e}", request.path());
            ApiError::Network(e)
        })?;
        self.save_cookies();
        ApiResponse::read(response).await
    }

    /// Decide what a failed response turns into
    async fn recover(
        &self,
        request: RequestDescriptor,
        response: ApiResponse,
    ) -> Result<ApiResponse> {
        let status = response.status();
        let path = self.inner.config.strip_base(request.path());

        if !request.is_retry()
            && self.inner.config.demo_fallback()
            && matches!(status, StatusCode::NOT_FOUND | StatusCode::UNAUTHORIZED)
        {
            if let Some(payload) = fallback::lookup(&path) {
                tracing::warn!("{status} on {path}, serving demo data");
                return Ok(ApiResponse::synthetic(payload));
            }
        }

        if status == StatusCode::UNAUTHORIZED && fallback::is_subscription_path(&path) {
            tracing::debug!("Subscription request {path} rejected, tagging as silent");
            return Err(ApiError::Subscription { status, path });
        }

        let recoverable = !request.is_retry() && !self.is_auth_endpoint(&path);
        let failure = response.into_error(path);
        if status == StatusCode::UNAUTHORIZED && recoverable {
            return self.refresh_and_retry(request, failure).await;
        }
        Err(failure)
    }

    /// Login, logout and refresh answer 401 for bad credentials, not expiry
    fn is_auth_endpoint(&self, path: &str) -> bool {
        let config = &self.inner.config;
        let endpoints = config.endpoints();
        [&endpoints.login, &endpoints.logout, &endpoints.refresh]
            .into_iter()
            .any(|endpoint| config.strip_base(endpoint) == path)
    }

    /// Refresh credentials once and re-issue `request`
    async fn refresh_and_retry(
        &self,
        request: RequestDescriptor,
        failure: ApiError,
    ) -> Result<ApiResponse> {
        match self.refresh_session().await {
            RefreshState::Retrying => {
                let retry = request.next_attempt();
                let response = self.dispatch(&retry).await?;
                if response.is_success() {
                    Ok(response)
                } else {
                    let path = self.inner.config.strip_base(retry.path());
                    tracing::debug!("Retried request {path} failed with {}", response.status());
                    Err(response.into_error(path))
                }
            }
            _ => Err(self.refresh_failed(failure)),
        }
    }

    /// Run the refresh step, returning the state it ends in
    async fn refresh_session(&self) -> RefreshState {
        let mut state = RefreshState::Normal;
        tracing::debug!("Authentication failed ({state:?}), attempting refresh");

        let Some(refresh_token) = self.refresh_credential() else {
            state = RefreshState::RefreshFailed;
            tracing::debug!("No usable refresh token ({state:?})");
            return state;
        };

        let inner = &self.inner;
        let endpoint = match inner.config.url_for(&inner.config.endpoints().refresh) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                tracing::warn!("Cannot build refresh URL: {e}");
                return RefreshState::RefreshFailed;
            }
        };

        state = match refresh::request_refresh(&inner.http, endpoint, &refresh_token).await {
            Ok(pair) => {
                if let Err(e) = self.apply_refresh(pair.access, pair.refresh) {
                    tracing::warn!("Refreshed tokens could not be persisted: {e}");
                }
                RefreshState::Retrying
            }
            Err(e) => {
                tracing::info!("Token refresh rejected: {e}");
                RefreshState::RefreshFailed
            }
        };
        tracing::debug!("Refresh finished in {state:?}");
        state
    }

    /// Clear the session unless the elevated-session guard applies
    fn refresh_failed(&self, failure: ApiError) -> ApiError {
        let route = self.current_route();
        if refresh::elevated_guard_holds(
            self.inner.storage.as_ref(),
            &route,
            self.inner.config.protected_routes(),
        ) {
            tracing::warn!("Refresh failed on protected route {route}, keeping elevated session");
            return failure;
        }

        if let Err(e) = self.end_session() {
            tracing::warn!("Failed to clear persisted session: {e}");
        }
        failure
    }

    /// Access credential from session state, falling back to persisted storage
    pub fn access_credential(&self) -> Credential {
        let credential = self.inner.store.session().access;
        if credential.is_present() {
            return credential;
        }

        let storage = &self.inner.storage;
        let raw = storage
            .get(ACCESS_TOKEN_KEY)
            .or_else(|| storage.get(LEGACY_TOKEN_KEY));
        Credential::from_raw(raw.as_deref())
    }

    /// Refresh token usable against the refresh endpoint, if any
    pub fn refresh_credential(&self) -> Option<String> {
        let session = self.inner.store.session();
        if let Some(token) = session.usable_refresh() {
            return Some(token.to_string());
        }

        let stored = self.inner.storage.get(REFRESH_TOKEN_KEY)?;
        Session {
            refresh: Some(stored),
            ..Session::default()
        }
        .usable_refresh()
        .map(str::to_string)
    }

    /// Install `session` and persist it
    pub fn start_session(&self, session: Session) -> Result<()> {
        let storage = &self.inner.storage;
        match session.access.to_raw() {
            Some(raw) => storage.set(ACCESS_TOKEN_KEY, raw)?,
            None => storage.remove(ACCESS_TOKEN_KEY)?,
        }
        storage.remove(LEGACY_TOKEN_KEY)?;
        match session.refresh.as_deref() {
            Some(refresh) => storage.set(REFRESH_TOKEN_KEY, refresh)?,
            None => storage.remove(REFRESH_TOKEN_KEY)?,
        }
        match &session.user {
            Some(user) => storage.set(USER_KEY, &user.to_string())?,
            None => storage.remove(USER_KEY)?,
        }
        // Set again by the caller when the new user is elevated
        storage.remove(ELEVATED_SESSION_KEY)?;

        tracing::info!("Session started ({:?})", kind_of(&session.access));
        self.inner.store.set_session(session);
        self.save_cookies();
        Ok(())
    }

    /// Persist the backend's cookies while a session is active
    fn save_cookies(&self) {
        if !self.access_credential().is_present() {
            return;
        }
        let Some(header) = self.inner.jar.cookies(self.inner.config.base_url()) else {
            return;
        };
        let Ok(cookies) = header.to_str() else {
            return;
        };

        let storage = &self.inner.storage;
        if storage.get(COOKIES_KEY).as_deref() == Some(cookies) {
            return;
        }
        if let Err(e) = storage.set(COOKIES_KEY, cookies) {
            tracing::warn!("Failed to persist cookies: {e}");
        }
    }

    fn apply_refresh(&self, access: String, refresh: Option<String>) -> Result<()> {
        self.inner.store.update_tokens(access.clone(), refresh.clone());
        let _ = self.inner.events.send(SessionEvent::Refreshed);

        let storage = &self.inner.storage;
        storage.set(ACCESS_TOKEN_KEY, &access)?;
        if let Some(refresh) = refresh {
            storage.set(REFRESH_TOKEN_KEY, &refresh)?;
        }
        Ok(())
    }

    /// Clear all session state and tell subscribers to log out
    pub fn end_session(&self) -> Result<()> {
        self.inner.store.clear();
        let cleared = self.inner.storage.clear_session();
        tracing::info!("Session cleared, signalling logout");
        // No subscribers is fine
        let _ = self.inner.events.send(SessionEvent::LoggedOut);
        cleared
    }
}

/// Seed `jar` with `name=value` pairs saved by [`ApiClient::save_cookies`]
fn restore_cookies(jar: &Jar, base_url: &Url, cookies: &str) {
    let pairs = cookies
        .split(';')
        .map(str::trim)
        .filter(|pair| pair.contains('='));
    for pair in pairs {
        jar.add_cookie_str(&format!("{pair}; Path=/"), base_url);
    }
    tracing::debug!("Restored persisted cookies for {base_url}");
}

fn kind_of(credential: &Credential) -> &'static str {
    match credential {
        Credential::Jwt(_) => "jwt",
        Credential::SessionCookie => "session cookie",
        Credential::Demo => "demo",
        Credential::None => "none",
    }
}
