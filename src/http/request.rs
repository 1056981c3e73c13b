//! # Request Descriptor
//!
//! One outbound call. Descriptors are immutable once built: a retry is a new
//! descriptor with a higher attempt number.

use super::config::HttpHeaders;
use reqwest::Method;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    headers: HttpHeaders,
    body: Option<Value>,
    attempt: u8,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
            attempt: 0,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_json(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, path).with_json(body)
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PATCH, path).with_json(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// 0 for the original call, 1 once re-issued after a refresh
    pub fn attempt(&self) -> u8 {
        self.attempt
    }

    pub fn is_retry(&self) -> bool {
        self.attempt > 0
    }

    /// The same request marked as the next attempt
    pub fn next_attempt(&self) -> Self {
        Self {
            attempt: self.attempt.saturating_add(1),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_should_create_with_defaults() {
        let request = RequestDescriptor::get("/api/doctors/");

        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.path(), "/api/doctors/");
        assert!(request.headers().is_empty());
        assert!(request.body().is_none());
        assert!(!request.is_retry());
    }

    #[test]
    fn next_attempt_should_leave_original_untouched() {
        let request = RequestDescriptor::post("/api/staff/", json!({"name": "Ana"}))
            .with_header("X-Trace", "1");
        let retry = request.next_attempt();

        assert_eq!(request.attempt(), 0);
        assert_eq!(retry.attempt(), 1);
        assert!(retry.is_retry());
        assert_eq!(retry.path(), request.path());
        assert_eq!(retry.body(), request.body());
        assert_eq!(retry.headers(), request.headers());
    }
}
