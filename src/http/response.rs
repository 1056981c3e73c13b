//! # API Response
//!
//! Fully-read HTTP response, either from the network or synthesised from the
//! demo fallback table.

use crate::error::{ApiError, Result};
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    synthetic: bool,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
            synthetic: false,
        }
    }

    /// Read status, headers and the whole body off a network response
    pub async fn read(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(Self::new(status, headers, body))
    }

    /// 200 response carrying a canned payload
    pub fn synthetic(payload: &Value) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::from(payload.to_string()),
            synthetic: true,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Whether the body came from the demo table instead of the server
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body as JSON; an empty body reads as `null`
    pub fn json_value(&self) -> Result<Value> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Convert a failed response into the error propagated to callers
    pub fn into_error(self, path: impl Into<String>) -> ApiError {
        ApiError::Status {
            status: self.status,
            path: path.into(),
            body: self.text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn synthetic_response_should_wrap_payload() {
        let payload = json!({"total_doctors": 12});
        let response = ApiResponse::synthetic(&payload);

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.is_synthetic());
        assert_eq!(response.json_value().unwrap(), payload);
    }

    #[test]
    fn empty_body_should_read_as_null() {
        let response = ApiResponse::new(StatusCode::NO_CONTENT, HeaderMap::new(), Bytes::new());
        assert_eq!(response.json_value().unwrap(), Value::Null);
    }

    #[test]
    fn into_error_should_keep_status_and_body() {
        let response = ApiResponse::new(
            StatusCode::BAD_REQUEST,
            HeaderMap::new(),
            Bytes::from_static(b"{\"email\":[\"required\"]}"),
        );

        match response.into_error("/api/staff/") {
            ApiError::Status { status, path, body } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(path, "/api/staff/");
                assert!(body.contains("required"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn json_should_report_decode_errors() {
        let response = ApiResponse::new(StatusCode::OK, HeaderMap::new(), Bytes::from("<html>"));
        assert!(matches!(response.json_value(), Err(ApiError::Decode(_))));
    }
}
