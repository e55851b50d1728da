//! Moltbook platform implementation
//!
//! Speaks the Moltbook REST API (`/api/v1`) through the rate-limited
//! requester. Responses use a `{"success": bool, ...}` envelope; a feed or
//! comment listing with `success: false` is treated as empty.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::credentials::Credentials;
use crate::error::{RemoteError, Result};
use crate::pacing::{Shutdown, Sleeper};
use crate::platforms::Platform;
use crate::requester::{HttpTransport, Request, Requester, Transport};
use crate::types::{Comment, CreatedPost, FeedItem, UserInfo, WireId, WirePost};

pub const DEFAULT_BASE_URL: &str = "https://www.moltbook.com/api/v1";

/// Moltbook API client
pub struct MoltbookClient {
    requester: Requester,
}

impl MoltbookClient {
    /// Create a client on top of an existing requester
    pub fn new(requester: Requester) -> Self {
        Self { requester }
    }

    /// Create a client speaking HTTP to the configured base URL
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP transport cannot be built.
    pub fn from_config(
        api: &ApiConfig,
        credentials: &Credentials,
        sleeper: Arc<dyn Sleeper>,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let policy = api.retry_policy();
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(
            &api.base_url,
            &credentials.api_key,
            policy.timeout,
        )?);
        Ok(Self::new(Requester::new(transport, policy, sleeper, shutdown)))
    }

    async fn listing(&self, request: Request, field: &str) -> Result<Vec<WirePost>> {
        let body = self.requester.execute(&request).await?.json()?;

        if body.get("success").and_then(Value::as_bool) == Some(false) {
            warn!(path = %request.path, "Service reported success=false, treating as empty");
            return Ok(Vec::new());
        }

        let entries = match body.get(field) {
            Some(Value::Array(entries)) => entries.clone(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                return Err(RemoteError::Unexpected(format!(
                    "Expected '{}' to be an array, got {}",
                    field, other
                ))
                .into())
            }
        };

        // Entries that do not decode are skipped rather than failing the listing
        Ok(entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<WirePost>(entry) {
                Ok(post) => Some(post),
                Err(e) => {
                    debug!("Skipping undecodable {} entry: {}", field, e);
                    None
                }
            })
            .collect())
    }
}

/// Pull the created id out of `{"id": ..}`, `{"post": {"id": ..}}` or `{"comment": {"id": ..}}`
fn created_id(body: &Value) -> Option<String> {
    let id = body
        .get("id")
        .or_else(|| body.get("post").and_then(|p| p.get("id")))
        .or_else(|| body.get("comment").and_then(|c| c.get("id")))?;
    serde_json::from_value::<WireId>(id.clone())
        .ok()
        .map(WireId::into_string)
}

/// Percent-encode an id or username for use as a single path segment
///
/// Empty and dot-only values would resolve to a different path once the URL
/// is normalized, so they are rejected as unusable targets.
fn path_segment(value: &str) -> Result<String> {
    if value.is_empty() || value.chars().all(|c| c == '.') {
        return Err(RemoteError::Validation(format!(
            "'{}' cannot be used as a path segment",
            value
        ))
        .into());
    }
    Ok(urlencoding::encode(value).into_owned())
}

#[async_trait]
impl Platform for MoltbookClient {
    async fn fetch_feed(&self, limit: usize) -> Result<Vec<FeedItem>> {
        let request = Request::get("/posts").query("limit", limit);
        let posts = self.listing(request, "posts").await?;
        Ok(posts
            .into_iter()
            .filter_map(WirePost::into_feed_item)
            .take(limit)
            .collect())
    }

    async fn like(&self, item_id: &str) -> Result<()> {
        let request = Request::post(format!("/posts/{}/upvote", path_segment(item_id)?));
        self.requester.execute(&request).await?;
        Ok(())
    }

    async fn create_post(&self, content: &str, parent_id: Option<&str>) -> Result<CreatedPost> {
        let mut body = json!({ "content": content });
        if let Some(parent) = parent_id {
            body["parent_id"] = json!(parent);
        }
        let request = Request::post("/posts").json(body).non_idempotent();

        // Any 2xx means the content exists; the id is informational
        let response = self.requester.execute(&request).await?;
        let id = match response.json() {
            Ok(body) => created_id(&body).unwrap_or_default(),
            Err(e) => {
                debug!(status = response.status, "Created without a JSON body: {}", e);
                String::new()
            }
        };
        Ok(CreatedPost { id })
    }

    async fn list_comments(&self, item_id: &str) -> Result<Vec<Comment>> {
        let request = Request::get(format!("/posts/{}/comments", path_segment(item_id)?));
        let comments = self.listing(request, "comments").await?;
        Ok(comments
            .into_iter()
            .filter_map(WirePost::into_comment)
            .collect())
    }

    async fn follow(&self, username: &str) -> Result<()> {
        let request = Request::post(format!("/users/{}/follow", path_segment(username)?));
        self.requester.execute(&request).await?;
        Ok(())
    }

    async fn user_info(&self, username: &str) -> Result<UserInfo> {
        let request = Request::get(format!("/users/{}", path_segment(username)?));
        let body = self.requester.execute(&request).await?.json()?;
        let user = body.get("user").unwrap_or(&body);

        Ok(UserInfo {
            username: user
                .get("username")
                .and_then(Value::as_str)
                .unwrap_or(username)
                .to_string(),
            display_name: user
                .get("display_name")
                .or_else(|| user.get("name"))
                .and_then(Value::as_str)
                .map(str::to_string),
            follower_count: user
                .get("follower_count")
                .or_else(|| user.get("followers"))
                .and_then(Value::as_u64),
        })
    }

    fn name(&self) -> &str {
        "moltbook"
    }
}
