//! # Session Refresh
//!
//! States of the refresh flow run when a request fails authentication, and
//! the raw call to the refresh endpoint. The call goes straight to the
//! `reqwest` client so it never re-enters the interceptor.

use super::response::ApiResponse;
use crate::error::Result;
use crate::session::Storage;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;

/// Where an authentication failure is in its recovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    /// Nothing attempted yet
    Normal,
    /// Credentials were refreshed; the original request is re-issued
    Retrying,
    /// No usable refresh credential or the refresh endpoint rejected it
    RefreshFailed,
}

/// New credentials returned by the refresh endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenPair {
    #[serde(alias = "access_token")]
    pub access: String,
    #[serde(default, alias = "refresh_token")]
    pub refresh: Option<String>,
}

/// Exchange a refresh token for a new access token
pub async fn request_refresh(
    http: &reqwest::Client,
    endpoint: Url,
    refresh_token: &str,
) -> Result<TokenPair> {
    tracing::debug!("Requesting token refresh from {endpoint}");
    let path = endpoint.path().to_string();
    let response = http
        .post(endpoint)
        .json(&json!({ "refresh": refresh_token }))
        .send()
        .await?;
    let response = ApiResponse::read(response).await?;
    if !response.is_success() {
        return Err(response.into_error(path));
    }
    response.json()
}

/// Whether an auth failure must leave session state alone.
///
/// Holds while an elevated-privilege session is recorded and the user is on
/// one of the protected routes.
pub fn elevated_guard_holds(storage: &dyn Storage, route: &str, protected: &[String]) -> bool {
    storage.elevated_session()
        && protected
            .iter()
            .any(|prefix| !prefix.is_empty() && route.starts_with(prefix.as_str()))
}
