//! # Wardline - Session-Aware REST Client for Hospital Backends
//!
//! Talks to a hospital-management REST backend (doctors, staff, diabetes
//! tracking, subscriptions, admin statistics) and owns everything between a
//! caller and the wire: CSRF tokens, bearer credentials, one-shot token
//! refresh, logout signalling and demo-data fallback.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  RequestDescriptor  ┌──────────────────────────┐   reqwest   ┌─────────┐
//! │  API wrappers│────────────────────▶│        ApiClient         │────────────▶│ Backend │
//! │ auth/admin/  │◀────────────────────│ CSRF + bearer interceptor│◀────────────│         │
//! │ resources    │  ApiResponse/Error  │ refresh / demo fallback  │             └─────────┘
//! └──────────────┘                     └────────────┬─────────────┘
//!                                                   │ get/set/clear
//!                                                   ▼
//!                                      ┌──────────────────────────┐
//!                                      │ SessionStore + Storage   │
//!                                      │ (injected, swappable)    │
//!                                      └──────────────────────────┘
//! ```

pub mod api;
pub mod cache;
pub mod chart;
pub mod cmd_args;
pub mod config;
pub mod error;
pub mod fallback;
pub mod http;
pub mod session;

// Re-export main types for easy access
pub use api::{AdminApi, AuthApi, ResourceApi, SubscriptionsApi};
pub use chart::{safe_chart_data, safe_chart_values, safe_round, sanitize_dataset};
pub use error::{ApiError, Result};
pub use http::{ApiClient, ApiResponse, ClientConfig, RequestDescriptor};
pub use session::{
    Credential, FileStorage, MemorySessionStore, MemoryStorage, Session, SessionEvent,
    SessionStore, Storage,
};
