//! Default transport over reqwest.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use crate::{
    ApiflowError, Result,
    config::RequestConfig,
    model::HttpMethod,
    transport::{Transport, TransportRequest, TransportResponse},
};

/// Transport implementation backed by a shared reqwest client.
///
/// The base URL, default headers and timeout come from [`RequestConfig`];
/// absolute request URLs are passed through untouched.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &RequestConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("accept"), HeaderValue::from_static("*/*"));

        for (key, value) in &config.headers {
            let name = key.parse::<HeaderName>().map_err(|err| ApiflowError::Config(format!("invalid header name '{}': {}", key, err)))?;
            let value = value.parse::<HeaderValue>().map_err(|err| ApiflowError::Config(format!("invalid header value for '{}': {}", key, err)))?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeout))
            .build()
            .map_err(|err| ApiflowError::Config(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn absolute_url(
        &self,
        url: &str,
    ) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}{}", self.base_url, url)
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Options => reqwest::Method::OPTIONS,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse> {
        let url = self.absolute_url(&request.url);

        let mut builder = self.client.request(request.method.into(), &url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let failure = |message: String| ApiflowError::Transport {
            node: String::new(),
            method: request.method.as_upper().to_string(),
            url: url.clone(),
            message,
        };

        let response = builder.send().await.map_err(|err| failure(err.to_string()))?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response.headers().iter().map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string())).collect();

        let text = response.text().await.map_err(|err| failure(err.to_string()))?;
        let data = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok(TransportResponse {
            status,
            headers,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url_joins_base() {
        let transport = HttpTransport::new(&RequestConfig {
            base_url: "http://localhost:3000/".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(transport.absolute_url("/api/v1/org"), "http://localhost:3000/api/v1/org");
        assert_eq!(transport.absolute_url("https://elsewhere.dev/x"), "https://elsewhere.dev/x");
    }
}
