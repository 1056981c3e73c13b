//! # Error Types
//!
//! Every failure the request pipeline can surface to a caller.

use reqwest::StatusCode;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by [`crate::ApiClient`] and the API wrappers built on it.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ApiError {
    /// No response was received (connect failure, timeout, broken body).
    #[error("Network error: unable to reach the server ({0})")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} for {path}")]
    Status {
        status: StatusCode,
        path: String,
        body: String,
    },

    /// Subscription endpoints reject unauthenticated callers routinely.
    /// Callers may ignore this variant instead of showing an error banner.
    #[error("Subscription request to {path} was rejected with {status}")]
    Subscription { status: StatusCode, path: String },

    #[error("Invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } | Self::Subscription { status, .. } => Some(*status),
            Self::Network(e) => e.status(),
            _ => None,
        }
    }

    /// Whether the error is an authentication failure
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Whether calling code may drop the error without alarming the user
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Subscription { .. })
    }
}
