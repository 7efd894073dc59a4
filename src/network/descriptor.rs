//! Per-call request description

use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::models::HttpMethod;

/// One API call: where it goes, how, and whether it needs the session.
///
/// Built fresh for every call and never stored.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestDescriptor {
    pub endpoint: String,
    pub method: HttpMethod,
    pub body: Option<Value>,
    pub requires_auth: bool,
}

impl RequestDescriptor {
    /// Authorized request without a body
    pub fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        RequestDescriptor {
            endpoint: endpoint.into(),
            method,
            body: None,
            requires_auth: true,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::POST, endpoint)
    }

    pub fn patch(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::PATCH, endpoint)
    }

    /// Attach a JSON body
    pub fn json<B: Serialize>(mut self, body: &B) -> ApiResult<Self> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Mark as not requiring authorization: no bearer header, no refresh.
    pub fn public(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    /// Full URL under an already-normalized base
    pub fn url(&self, base_url: &str) -> String {
        if self.endpoint.starts_with('/') {
            format!("{}{}", base_url, self.endpoint)
        } else {
            format!("{}/{}", base_url, self.endpoint)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_join() {
        let base = "https://api.example.com";
        assert_eq!(
            RequestDescriptor::get("/api/auth/me").url(base),
            "https://api.example.com/api/auth/me"
        );
        assert_eq!(
            RequestDescriptor::get("api/auth/me").url(base),
            "https://api.example.com/api/auth/me"
        );
    }

    #[test]
    fn test_builders() {
        let desc = RequestDescriptor::post("/api/auth/login")
            .json(&serde_json::json!({"email": "a@b.c"}))
            .unwrap()
            .public();
        assert_eq!(desc.method, HttpMethod::POST);
        assert!(!desc.requires_auth);
        assert_eq!(desc.body, Some(serde_json::json!({"email": "a@b.c"})));

        assert!(RequestDescriptor::patch("/api/auth/me").requires_auth);
    }
}
