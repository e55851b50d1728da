//! Rate-limited request execution
//!
//! The [`Requester`] issues one logical remote operation at a time over a
//! [`Transport`], retrying failures according to a [`RetryPolicy`]:
//!
//! - rate-limit rejections wait for the server's retry-after hint
//! - transport failures (connect errors, timeouts) back off exponentially
//! - server errors are retried only for idempotent requests
//!
//! A request is attempted at most `max_retries + 1` times.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{RemoteError, Result};
use crate::pacing::{Shutdown, Sleeper};

pub mod http;

pub use http::HttpTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// One logical remote operation
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    /// Path relative to the API base URL, e.g. `/posts`
    pub path: String,
    pub query: Vec<(String, String)>,
    /// Extra headers on top of the transport's auth headers
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Whether re-issuing after an ambiguous response is safe
    pub idempotent: bool,
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            idempotent: true,
        }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            ..Self::get(path)
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Mark the request as creating remote content
    pub fn non_idempotent(mut self) -> Self {
        self.idempotent = false;
        self
    }
}

/// Raw answer from the remote service
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    /// Seconds from a `Retry-After` header, if present
    pub retry_after_secs: Option<u64>,
    pub body: String,
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            retry_after_secs: None,
            body: body.into(),
        }
    }

    pub fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after_secs = Some(secs);
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON, treating an empty body as `null`
    pub fn json(&self) -> Result<Value> {
        if self.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&self.body).map_err(|e| {
            RemoteError::Unexpected(format!("Response body is not valid JSON: {}", e)).into()
        })
    }

    /// Retry hint from the header, falling back to a `retry_after` body field
    fn retry_hint(&self) -> Option<u64> {
        self.retry_after_secs.or_else(|| {
            let body: Value = serde_json::from_str(&self.body).ok()?;
            body.get("retry_after")
                .or_else(|| body.get("retry_after_seconds"))
                .and_then(Value::as_u64)
        })
    }

    /// Map a non-success status into its error class
    pub fn into_result(self) -> std::result::Result<Response, RemoteError> {
        match RemoteError::from_status(self.status, &self.body, self.retry_hint()) {
            None => Ok(self),
            Some(error) => Err(error),
        }
    }
}

/// Sends a single attempt of a request
///
/// Implementations return every HTTP answer, including error statuses, as
/// `Ok(Response)`. Only failures before a status arrived (connect errors,
/// timeouts) map to `RemoteError::Transport`; a body that cannot be read
/// after the status is `Unexpected`, or `Server` for a 5xx.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &Request) -> std::result::Result<Response, RemoteError>;
}

/// Retry and timeout parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff: `base_delay * 2^attempt`, attempt starting at 0
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2_u32.saturating_pow(attempt.min(16)))
    }

    /// Whether `error` may be retried for `request` at all
    pub fn is_retryable(&self, request: &Request, error: &RemoteError) -> bool {
        match error {
            RemoteError::Transport(_) | RemoteError::RateLimit { .. } => true,
            RemoteError::Server(_) => request.idempotent,
            RemoteError::Authentication(_)
            | RemoteError::Validation(_)
            | RemoteError::NotFound(_)
            | RemoteError::Unexpected(_)
            | RemoteError::Cancelled => false,
        }
    }

    /// Delay before the retry that follows failed attempt number `attempt`
    pub fn delay_for(&self, error: &RemoteError, attempt: u32) -> Duration {
        match error {
            RemoteError::RateLimit {
                retry_after_secs: Some(secs),
                ..
            } => Duration::from_secs(*secs),
            _ => self.backoff_delay(attempt),
        }
    }
}

/// Executes requests one at a time with retry and backoff
#[derive(Clone)]
pub struct Requester {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    shutdown: Shutdown,
}

impl Requester {
    pub fn new(
        transport: Arc<dyn Transport>,
        policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            transport,
            policy,
            sleeper,
            shutdown,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute a request, retrying per the policy
    ///
    /// # Errors
    ///
    /// Returns the last failure once retries are exhausted, the first
    /// non-retryable failure, or `RemoteError::Cancelled` if shutdown was
    /// requested while waiting to retry.
    pub async fn execute(&self, request: &Request) -> Result<Response> {
        let mut attempt: u32 = 0;

        loop {
            debug!(
                method = %request.method,
                path = %request.path,
                attempt = attempt + 1,
                "Sending request"
            );

            let failure = match self.transport.send(request).await {
                Ok(response) => match response.into_result() {
                    Ok(response) => return Ok(response),
                    Err(e) => e,
                },
                Err(e) => e,
            };

            if !self.policy.is_retryable(request, &failure) {
                return Err(failure.into());
            }

            if attempt >= self.policy.max_retries {
                warn!(
                    method = %request.method,
                    path = %request.path,
                    "Giving up after {} attempts: {}",
                    attempt + 1,
                    failure
                );
                return Err(failure.into());
            }

            let delay = self.policy.delay_for(&failure, attempt);
            warn!(
                method = %request.method,
                path = %request.path,
                "Attempt {}/{} failed: {}. Retrying in {}",
                attempt + 1,
                self.policy.max_retries + 1,
                failure,
                humantime::format_duration(delay)
            );
            self.sleeper.sleep(delay).await;

            if self.shutdown.is_triggered() {
                return Err(RemoteError::Cancelled.into());
            }

            attempt += 1;
        }
    }
}
