//! HTTP transport for the TubeGenie API.
//!
//! The bearer token is an argument of every call and goes straight onto that
//! request's headers. The client itself never holds a token, so concurrent
//! calls made on behalf of different sessions cannot see each other's
//! credentials.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::BearerToken;
use crate::{Config, Error, Result};

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// A request relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        let mut request = Self::new(Method::POST, path);
        request.body = Some(body);
        request
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }
}

/// Status and parsed JSON body of a 2xx response.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

/// Failures below the envelope level.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{0}")]
    Network(String),

    #[error("Request failed with status code {status}")]
    Status { status: u16, body: Value },
}

/// Executes API requests. The seam services are written against.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(
        &self,
        request: ApiRequest,
        token: &BearerToken,
    ) -> std::result::Result<RawResponse, TransportError>;
}

/// `reqwest`-backed transport bound to one base URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Build the shared client: base URL, JSON content type, optional timeout.
    pub fn new(config: &Config) -> Result<Self> {
        let base = Url::parse(&config.api_base_url).map_err(|e| {
            Error::Config(format!("Invalid API base URL {:?}: {}", config.api_base_url, e))
        })?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder().default_headers(default_headers);
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get(
        &self,
        path: &str,
        token: &BearerToken,
    ) -> std::result::Result<RawResponse, TransportError> {
        self.execute(ApiRequest::get(path), token).await
    }

    pub async fn post(
        &self,
        path: &str,
        body: Value,
        token: &BearerToken,
    ) -> std::result::Result<RawResponse, TransportError> {
        self.execute(ApiRequest::post(path, body), token).await
    }

    pub async fn patch(
        &self,
        path: &str,
        token: &BearerToken,
    ) -> std::result::Result<RawResponse, TransportError> {
        self.execute(ApiRequest::patch(path), token).await
    }

    pub async fn delete(
        &self,
        path: &str,
        token: &BearerToken,
    ) -> std::result::Result<RawResponse, TransportError> {
        self.execute(ApiRequest::delete(path), token).await
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        request: ApiRequest,
        token: &BearerToken,
    ) -> std::result::Result<RawResponse, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        let request_id = Uuid::new_v4();
        let started = Instant::now();

        debug!(
            request_id = %request_id,
            method = %request.method,
            path = %request.path,
            "Sending API request"
        );

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .header(AUTHORIZATION, token.header_value())
            .header(REQUEST_ID_HEADER, request_id.to_string());

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(request_id = %request_id, error = %e, "API request failed");
            TransportError::Network(e.to_string())
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Network(format!("Failed to read response body: {}", e)))?;

        // Non-JSON bodies are kept as strings; envelope parsing rejects them.
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        debug!(
            request_id = %request_id,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "API response received"
        );

        if !status.is_success() {
            warn!(
                request_id = %request_id,
                status = status.as_u16(),
                path = %request.path,
                "API returned non-success status"
            );
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(RawResponse {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalized() {
        let transport = HttpTransport::new(&Config::new("http://localhost:8000/")).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpTransport::new(&Config::new("not a url")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_request_builders() {
        let request = ApiRequest::get("/api/content/history").with_query("limit", 20);
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.query, vec![("limit".to_string(), "20".to_string())]);
        assert!(request.body.is_none());

        let request = ApiRequest::post("/api/content/generate", serde_json::json!({"topic": "t"}));
        assert_eq!(request.method, Method::POST);
        assert!(request.body.is_some());
    }
}
