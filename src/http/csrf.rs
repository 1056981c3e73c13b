//! # CSRF Token Resolution
//!
//! The token comes from the cookie jar when the server already set it,
//! otherwise from one call to the CSRF endpoint. Resolution is best-effort:
//! a failed fetch means the request goes out without the header.

use super::config::ClientConfig;
use crate::error::Result;
use regex::Regex;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;
use serde_json::Value;

/// Body fields the CSRF endpoint may carry the token in
const TOKEN_FIELDS: [&str; 2] = ["csrfToken", "csrf_token"];

#[derive(Debug)]
pub struct CsrfResolver {
    base_url: Url,
    endpoint: Url,
    cookie_pattern: Regex,
}

impl CsrfResolver {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let pattern = format!(r"(?:^|;\s*){}=([^;]+)", regex::escape(config.csrf_cookie()));
        let cookie_pattern = Regex::new(&pattern).map_err(|e| {
            crate::error::ApiError::Config(format!("invalid CSRF cookie name: {e}"))
        })?;

        Ok(Self {
            base_url: config.base_url().clone(),
            endpoint: config.url_for(&config.endpoints().csrf)?,
            cookie_pattern,
        })
    }

    /// Token already present in the cookie jar for the backend
    pub fn from_cookies(&self, jar: &Jar) -> Option<String> {
        let header = jar.cookies(&self.base_url)?;
        let cookies = header.to_str().ok()?;
        self.cookie_pattern
            .captures(cookies)
            .map(|captures| captures[1].trim().to_string())
            .filter(|token| !token.is_empty())
    }

    /// Cookie first, then a single fetch from the CSRF endpoint
    pub async fn resolve(&self, http: &reqwest::Client, jar: &Jar) -> Option<String> {
        if let Some(token) = self.from_cookies(jar) {
            return Some(token);
        }

        tracing::debug!("No CSRF cookie, fetching token from {}", self.endpoint);
        match self.fetch(http).await {
            Ok(Some(token)) => Some(token),
            // The endpoint may only set the cookie
            Ok(None) => self.from_cookies(jar),
            Err(e) => {
                tracing::warn!("CSRF token fetch failed, continuing without it: {e}");
                None
            }
        }
    }

    async fn fetch(&self, http: &reqwest::Client) -> Result<Option<String>> {
        let response = http
            .get(self.endpoint.clone())
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        Ok(TOKEN_FIELDS
            .iter()
            .find_map(|field| body.get(field).and_then(Value::as_str))
            .map(str::to_string))
    }
}
