//! # Resource API
//!
//! CRUD over the backend's REST collections. Payloads stay opaque JSON.

use crate::error::Result;
use crate::http::ApiClient;
use serde_json::{json, Value};
use std::fmt::Display;

pub const DOCTORS: &str = "/api/doctors/";
pub const STAFF: &str = "/api/staff/";
pub const USERS: &str = "/api/users/";
pub const DIABETES_PATIENTS: &str = "/api/diabetes/patients/";
pub const DIABETES_RECORDS: &str = "/api/diabetes/records/";
pub const SUBSCRIPTIONS: &str = "/api/subscriptions/";

/// One REST collection such as `/api/doctors/`
#[derive(Debug, Clone)]
pub struct ResourceApi {
    client: ApiClient,
    collection: String,
}

impl ResourceApi {
    pub fn new(client: ApiClient, collection: impl Into<String>) -> Self {
        let mut collection = collection.into();
        if !collection.ends_with('/') {
            collection.push('/');
        }
        Self { client, collection }
    }

    pub fn doctors(client: ApiClient) -> Self {
        Self::new(client, DOCTORS)
    }

    pub fn staff(client: ApiClient) -> Self {
        Self::new(client, STAFF)
    }

    pub fn users(client: ApiClient) -> Self {
        Self::new(client, USERS)
    }

    pub fn diabetes_patients(client: ApiClient) -> Self {
        Self::new(client, DIABETES_PATIENTS)
    }

    pub fn diabetes_records(client: ApiClient) -> Self {
        Self::new(client, DIABETES_RECORDS)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn item_path(&self, id: impl Display) -> String {
        format!("{}{id}/", self.collection)
    }

    /// List the collection, optionally filtered by query parameters
    pub async fn list(&self, query: &[(&str, &str)]) -> Result<Value> {
        let target = if query.is_empty() {
            self.collection.clone()
        } else {
            let mut url = self.client.config().url_for(&self.collection)?;
            url.query_pairs_mut().extend_pairs(query);
            url.to_string()
        };
        self.client.get(&target).await?.json_value()
    }

    pub async fn get(&self, id: impl Display) -> Result<Value> {
        self.client.get(&self.item_path(id)).await?.json_value()
    }

    pub async fn create(&self, body: Value) -> Result<Value> {
        self.client.post(&self.collection, body).await?.json_value()
    }

    pub async fn update(&self, id: impl Display, body: Value) -> Result<Value> {
        self.client.put(&self.item_path(id), body).await?.json_value()
    }

    pub async fn patch(&self, id: impl Display, body: Value) -> Result<Value> {
        self.client.patch(&self.item_path(id), body).await?.json_value()
    }

    pub async fn delete(&self, id: impl Display) -> Result<()> {
        self.client.delete(&self.item_path(id)).await?;
        Ok(())
    }

    /// GET a path nested under the collection, e.g. `stats/`
    pub async fn nested(&self, suffix: &str) -> Result<Value> {
        let path = format!("{}{}", self.collection, suffix.trim_start_matches('/'));
        self.client.get(&path).await?.json_value()
    }
}

/// Diabetes readings scoped to one patient
pub async fn records_for_patient(client: &ApiClient, patient_id: impl Display) -> Result<Value> {
    let patient_id = patient_id.to_string();
    ResourceApi::diabetes_records(client.clone())
        .list(&[("patient", patient_id.as_str())])
        .await
}

/// Subscription endpoints, whose auth failures are silent
#[derive(Debug, Clone)]
pub struct SubscriptionsApi {
    resource: ResourceApi,
}

impl SubscriptionsApi {
    pub fn new(client: ApiClient) -> Self {
        Self {
            resource: ResourceApi::new(client, SUBSCRIPTIONS),
        }
    }

    /// Public plan listing
    pub async fn plans(&self) -> Result<Value> {
        self.resource.nested("plans/").await
    }

    /// The active subscription; `None` when the backend silently refuses
    pub async fn current(&self) -> Result<Option<Value>> {
        match self.resource.nested("current/").await {
            Ok(subscription) => Ok(Some(subscription)),
            Err(e) if e.is_silent() => {
                tracing::debug!("No subscription visible: {e}");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn subscribe(&self, plan_id: &str) -> Result<Value> {
        self.resource.create(json!({ "plan": plan_id })).await
    }

    pub async fn cancel(&self, subscription_id: impl Display) -> Result<()> {
        self.resource.delete(subscription_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ClientConfig;
    use wiremock::matchers::{body_json, method, path, query_param};
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

    #[test]
    fn new_should_normalize_trailing_slash() {
        let client = ApiClient::new(ClientConfig::new("http://localhost").unwrap()).unwrap();
        let api = ResourceApi::new(client, "/api/wards");
        assert_eq!(api.collection(), "/api/wards/");
        assert_eq!(api.item_path(4), "/api/wards/4/");
    }

    #[tokio::test]
    async fn doctors_crud_should_hit_expected_paths() {
        let (server, client) = setup().await;
        Mock::given(method("POST"))
            .and(path("/api/doctors/"))
            .and(body_json(json!({"first_name": "Amina"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 5})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/doctors/5/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5, "is_available": false})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/doctors/5/"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let doctors = ResourceApi::doctors(client);
        let created = doctors.create(json!({"first_name": "Amina"})).await.unwrap();
        assert_eq!(created["id"], 5);

        let patched = doctors.patch(5, json!({"is_available": false})).await.unwrap();
        assert_eq!(patched["is_available"], false);

        doctors.delete(5).await.unwrap();
    }

    #[tokio::test]
    async fn records_for_patient_should_filter_by_query() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/api/diabetes/records/"))
            .and(query_param("patient", "12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"glucose": 130}])))
            .expect(1)
            .mount(&server)
            .await;

        let records = records_for_patient(&client, 12).await.unwrap();
        assert_eq!(records[0]["glucose"], 130);
    }

    #[tokio::test]
    async fn current_subscription_should_be_none_when_silently_refused() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/api/subscriptions/current/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let subscriptions = SubscriptionsApi::new(client);
        assert_eq!(subscriptions.current().await.unwrap(), None);
    }

    #[tokio::test]
    async fn plans_should_use_demo_payload_when_missing() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/api/subscriptions/plans/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let plans = SubscriptionsApi::new(client).plans().await.unwrap();
        assert_eq!(plans[0]["id"], "basic");
    }
}
