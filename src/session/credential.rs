//! # Credentials
//!
//! Access credentials as a tagged union instead of magic strings.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::Value;

/// Persisted marker for cookie-based (server session) authentication
pub const SESSION_AUTH_SENTINEL: &str = "session-auth";

/// Persisted marker for the offline demo login
pub const DEMO_SENTINEL: &str = "demo-token";

/// The access credential attached to outbound requests
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Credential {
    /// A bearer token issued by the backend
    Jwt(String),
    /// Authentication rides on the server session cookie
    SessionCookie,
    /// Demo session with no server-side identity
    Demo,
    #[default]
    None,
}

impl Credential {
    /// Classify a raw persisted value
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") | Some("null") | Some("undefined") => Self::None,
            Some(SESSION_AUTH_SENTINEL) => Self::SessionCookie,
            Some(DEMO_SENTINEL) => Self::Demo,
            Some(token) => Self::Jwt(token.to_string()),
        }
    }

    /// The value written to persisted storage, `None` when nothing should be stored
    pub fn to_raw(&self) -> Option<&str> {
        match self {
            Self::Jwt(token) => Some(token),
            Self::SessionCookie => Some(SESSION_AUTH_SENTINEL),
            Self::Demo => Some(DEMO_SENTINEL),
            Self::None => None,
        }
    }

    /// Token to send as `Authorization: Bearer`, only for real tokens
    pub fn bearer(&self) -> Option<&str> {
        match self {
            Self::Jwt(token) => Some(token),
            _ => None,
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Decode the claims segment of a JWT without verifying it.
///
/// Returns `None` for anything that is not three dot-separated base64url parts
/// with a JSON object in the middle.
pub fn decode_claims(token: &str) -> Option<Value> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    match serde_json::from_slice::<Value>(&bytes).ok()? {
        claims @ Value::Object(_) => Some(claims),
        _ => None,
    }
}
