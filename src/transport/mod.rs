//! HTTP transport boundary.
//!
//! The crawler delegates every network call through the [`Transport`]
//! trait. Any returned response, whatever its status code, is data; only a
//! transport-level failure with no response at all is fatal. Tests swap in
//! scripted implementations.

mod http;

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::{Result, model::HttpMethod};

pub use http::HttpTransport;

/// A fully resolved outbound request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: String,
    pub body: Option<Value>,
}

/// What came back from the wire.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub data: Value,
}

impl TransportResponse {
    /// Content type of the response, with parameters stripped.
    pub fn content_type(&self) -> &str {
        self.headers
            .get("content-type")
            .map(|value| value.split(';').next().unwrap_or(value).trim())
            .unwrap_or("application/json")
    }
}

/// Dispatches resolved requests against the live API.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute one request.
    ///
    /// Implementations return `Ok` for every completed exchange, including
    /// HTTP error statuses, and [`crate::ApiflowError::Transport`] only when
    /// no response was received at all.
    async fn send(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_strips_parameters() {
        let response = TransportResponse {
            status: 200,
            headers: HashMap::from([("content-type".to_string(), "application/json; charset=utf-8".to_string())]),
            data: Value::Null,
        };
        assert_eq!(response.content_type(), "application/json");
    }

    #[test]
    fn test_content_type_defaults_to_json() {
        let response = TransportResponse {
            status: 200,
            headers: HashMap::new(),
            data: Value::Null,
        };
        assert_eq!(response.content_type(), "application/json");
    }
}
