//! # API Wrappers
//!
//! Typed entry points over [`crate::ApiClient`] for the hospital backend.

pub mod admin;
pub mod auth;
pub mod resources;

pub use admin::AdminApi;
pub use auth::AuthApi;
pub use resources::{records_for_patient, ResourceApi, SubscriptionsApi};
