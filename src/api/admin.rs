//! # Admin API
//!
//! Dashboard statistics, cached for a short TTL since admin pages poll them.

use crate::cache::TtlCache;
use crate::error::Result;
use crate::http::ApiClient;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_STATS_TTL: Duration = Duration::from_secs(60);
pub const DASHBOARD_STATS: &str = "/api/admin/dashboard/stats/";
pub const USER_STATS: &str = "/api/admin/users/stats/";

#[derive(Debug, Clone)]
pub struct AdminApi {
    client: ApiClient,
    cache: Arc<TtlCache<String, Value>>,
}

impl AdminApi {
    pub fn new(client: ApiClient) -> Self {
        Self::with_ttl(client, DEFAULT_STATS_TTL)
    }

    pub fn with_ttl(client: ApiClient, ttl: Duration) -> Self {
        Self {
            client,
            cache: Arc::new(TtlCache::new(ttl)),
        }
    }

    pub async fn dashboard_stats(&self) -> Result<Value> {
        self.cached_get(DASHBOARD_STATS).await
    }

    pub async fn user_stats(&self) -> Result<Value> {
        self.cached_get(USER_STATS).await
    }

    /// Drop every cached statistic
    pub fn invalidate(&self) {
        self.cache.clear();
    }

    async fn cached_get(&self, path: &str) -> Result<Value> {
        let key = path.to_string();
        if let Some(value) = self.cache.get(&key) {
            tracing::debug!("Serving {path} from cache");
            return Ok(value);
        }

        let response = self.client.get(path).await?;
        let value = response.json_value()?;
        // Demo payloads must not mask the backend coming back
        if !response.is_synthetic() {
            self.cache.insert(key, value.clone());
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ClientConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> (MockServer, ApiClient) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/csrf/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"csrfToken": "c"})))
            .mount(&server)
            .await;
        let client = ApiClient::new(ClientConfig::new(&server.uri()).unwrap()).unwrap();
        (server, client)
    }

    #[tokio::test]
    async fn dashboard_stats_should_be_cached() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path(DASHBOARD_STATS))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total_users": 3})))
            .expect(1)
            .mount(&server)
            .await;

        let admin = AdminApi::new(client);
        assert_eq!(admin.dashboard_stats().await.unwrap()["total_users"], 3);
        assert_eq!(admin.dashboard_stats().await.unwrap()["total_users"], 3);
    }

    #[tokio::test]
    async fn invalidate_should_force_refetch() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path(USER_STATS))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"admins": 1})))
            .expect(2)
            .mount(&server)
            .await;

        let admin = AdminApi::new(client);
        admin.user_stats().await.unwrap();
        admin.invalidate();
        admin.user_stats().await.unwrap();
    }

    #[tokio::test]
    async fn demo_payloads_should_not_be_cached() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path(DASHBOARD_STATS))
            .respond_with(ResponseTemplate::new(404))
            .expect(2)
            .mount(&server)
            .await;

        let admin = AdminApi::new(client);
        let first = admin.dashboard_stats().await.unwrap();
        let second = admin.dashboard_stats().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first["active_subscriptions"], 18);
    }
}
