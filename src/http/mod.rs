//! # HTTP Layer
//!
//! Client configuration, request/response types and the interceptor pipeline
//! (CSRF, bearer, refresh, demo fallback) wrapped around `reqwest`.

pub mod client;
pub mod config;
pub mod csrf;
pub mod refresh;
pub mod request;
pub mod response;

pub use client::{ApiClient, ApiClientBuilder};
pub use config::{ClientConfig, Endpoints, HttpHeaders};
pub use refresh::{RefreshState, TokenPair};
pub use request::RequestDescriptor;
pub use response::ApiResponse;
