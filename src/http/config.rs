//! # Client Configuration
//!
//! Base URL, timeout, default headers and endpoint paths, and construction of
//! the underlying `reqwest` client from them.

use crate::error::{ApiError, Result};
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CSRF_COOKIE: &str = "csrftoken";
pub const DEFAULT_CSRF_HEADER: &str = "X-CSRFToken";
pub const DEFAULT_PROTECTED_ROUTE: &str = "/superadmin";

/// Type alias for header pairs, kept in insertion order
pub type HttpHeaders = Vec<(String, String)>;

/// Backend paths the session machinery talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub csrf: String,
    pub login: String,
    pub logout: String,
    pub refresh: String,
    pub current_user: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            csrf: "/api/csrf/".to_string(),
            login: "/api/auth/login/".to_string(),
            logout: "/api/auth/logout/".to_string(),
            refresh: "/api/token/refresh/".to_string(),
            current_user: "/api/auth/user/".to_string(),
        }
    }
}

/// Everything needed to build an [`crate::ApiClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: Url,
    timeout: Duration,
    default_headers: HttpHeaders,
    endpoints: Endpoints,
    csrf_cookie: String,
    csrf_header: String,
    protected_routes: Vec<String>,
    demo_fallback: bool,
}

impl ClientConfig {
    /// Create a configuration for the backend at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Config(format!("invalid base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Config(format!(
                "base URL '{base_url}' cannot carry paths"
            )));
        }

        Ok(Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            default_headers: Vec::new(),
            endpoints: Endpoints::default(),
            csrf_cookie: DEFAULT_CSRF_COOKIE.to_string(),
            csrf_header: DEFAULT_CSRF_HEADER.to_string(),
            protected_routes: vec![DEFAULT_PROTECTED_ROUTE.to_string()],
            demo_fallback: true,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_csrf_names(
        mut self,
        cookie: impl Into<String>,
        header: impl Into<String>,
    ) -> Self {
        self.csrf_cookie = cookie.into();
        self.csrf_header = header.into();
        self
    }

    pub fn with_protected_routes(mut self, routes: Vec<String>) -> Self {
        self.protected_routes = routes;
        self
    }

    pub fn with_demo_fallback(mut self, enabled: bool) -> Self {
        self.demo_fallback = enabled;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn default_headers(&self) -> &HttpHeaders {
        &self.default_headers
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn csrf_cookie(&self) -> &str {
        &self.csrf_cookie
    }

    pub fn csrf_header(&self) -> &str {
        &self.csrf_header
    }

    pub fn protected_routes(&self) -> &[String] {
        &self.protected_routes
    }

    pub fn demo_fallback(&self) -> bool {
        self.demo_fallback
    }

    /// Resolve a request path (or an absolute URL) against the base URL
    pub fn url_for(&self, path: &str) -> Result<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Url::parse(path)
                .map_err(|e| ApiError::Config(format!("invalid URL '{path}': {e}")));
        }

        let base = self.base_url.as_str().trim_end_matches('/');
        let joined = format!("{base}/{}", path.trim_start_matches('/'));
        Url::parse(&joined).map_err(|e| ApiError::Config(format!("invalid URL '{joined}': {e}")))
    }

    /// Path relative to the base URL with query and fragment removed
    pub fn strip_base(&self, target: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        let rest = target.strip_prefix(base).unwrap_or(target);
        let rest = rest.split(['?', '#']).next().unwrap_or_default();

        if rest.starts_with('/') {
            rest.to_string()
        } else {
            format!("/{rest}")
        }
    }

    /// Build the HTTP client sharing `jar` for cookies
    pub fn build_http_client(&self, jar: Arc<Jar>) -> Result<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        for (name, value) in &self.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::Config(format!("invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::Config(format!("invalid value for header {name}: {e}")))?;
            headers.insert(name, value);
        }

        tracing::debug!(
            "Building HTTP client for {} (timeout {:?})",
            self.base_url,
            self.timeout
        );

        reqwest::Client::builder()
            .timeout(self.timeout)
            .default_headers(headers)
            .cookie_provider(jar)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))
    }
}
