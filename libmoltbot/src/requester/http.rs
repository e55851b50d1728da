//! HTTP transport backed by reqwest

use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER,
};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use super::{Method, Request, Response, Transport};
use crate::error::{ConfigError, RemoteError, Result};

/// Sends requests to a JSON REST API with bearer authentication
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for `base_url`
    ///
    /// Every request carries `timeout`; exceeding it is reported as a
    /// transport failure.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the API key cannot be used as a header
    /// value or the HTTP client cannot be built.
    pub fn new(base_url: &str, api_key: &SecretString, timeout: Duration) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|_| ConfigError::Invalid {
                field: "api_key".to_string(),
                reason: "contains characters not allowed in an HTTP header".to_string(),
            })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .user_agent(concat!("moltbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::Invalid {
                field: "api".to_string(),
                reason: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &Request) -> std::result::Result<Response, RemoteError> {
        let url = self.url(&request.path);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| RemoteError::Unexpected(format!("Invalid header name: {}", e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| RemoteError::Unexpected(format!("Invalid header value: {}", e)))?;
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_send_error)?;

        let status = response.status().as_u16();
        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response
            .text()
            .await
            .map_err(|e| body_read_error(status, &e))?;

        Ok(Response {
            status,
            retry_after_secs,
            body,
        })
    }
}

/// Classify a failure before any status arrived
fn map_send_error(error: reqwest::Error) -> RemoteError {
    if error.is_builder() {
        RemoteError::Unexpected(format!("Invalid request: {}", error))
    } else if error.is_timeout() {
        RemoteError::Transport(format!("Request timed out: {}", error))
    } else if error.is_connect() {
        RemoteError::Transport(format!("Connection failed: {}", error))
    } else {
        RemoteError::Transport(error.to_string())
    }
}

/// Classify a failure to read the body after `status` arrived
///
/// The server has already acted on the request, so this is never a
/// transport failure.
fn body_read_error(status: u16, error: &reqwest::Error) -> RemoteError {
    let detail = format!("HTTP {}: failed to read response body: {}", status, error);
    if (500..600).contains(&status) {
        RemoteError::Server(detail)
    } else {
        RemoteError::Unexpected(detail)
    }
}
