//! Mock platform implementation for testing
//!
//! This module provides a configurable in-memory platform that serves a fixed
//! feed and records every side-effecting call. Individual targets can be made
//! to fail with a chosen error, so task policies can be exercised without
//! network access.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{RemoteError, Result};
use crate::platforms::Platform;
use crate::types::{Comment, CreatedPost, FeedItem, UserInfo};

/// A side-effecting call observed by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Like(String),
    Follow(String),
    CreatePost {
        content: String,
        parent_id: Option<String>,
    },
}

/// Configuration for mock platform behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Items served by `fetch_feed`, in feed order
    pub feed: Vec<FeedItem>,

    /// Comments served by `list_comments`, keyed by item id
    pub comments: HashMap<String, Vec<Comment>>,

    /// Error returned by `fetch_feed`
    pub feed_error: Option<RemoteError>,

    /// Errors returned for specific like / follow / reply targets
    pub target_errors: HashMap<String, RemoteError>,

    /// Error returned by every `create_post`
    pub post_error: Option<RemoteError>,
}

/// Mock platform for testing
///
/// Clones share the same call log, so a test can hand one clone to the
/// scheduler and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MockPlatform {
    config: Arc<Mutex<MockConfig>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
    feed_fetches: Arc<Mutex<Vec<usize>>>,
    comment_lookups: Arc<Mutex<Vec<String>>>,
}

impl MockPlatform {
    /// Create a new mock platform with the given configuration
    pub fn new(config: MockConfig) -> Self {
        Self {
            config: Arc::new(Mutex::new(config)),
            ..Default::default()
        }
    }

    /// Create a mock platform serving `feed`
    pub fn with_feed(feed: Vec<FeedItem>) -> Self {
        Self::new(MockConfig {
            feed,
            ..Default::default()
        })
    }

    /// Replace the served feed
    pub fn set_feed(&self, feed: Vec<FeedItem>) {
        self.config.lock().unwrap().feed = feed;
    }

    /// Make every action on `target` fail with `error`
    pub fn fail_target(&self, target: &str, error: RemoteError) {
        self.config
            .lock()
            .unwrap()
            .target_errors
            .insert(target.to_string(), error);
    }

    pub fn fail_feed(&self, error: RemoteError) {
        self.config.lock().unwrap().feed_error = Some(error);
    }

    pub fn fail_posts(&self, error: RemoteError) {
        self.config.lock().unwrap().post_error = Some(error);
    }

    pub fn set_comments(&self, item_id: &str, comments: Vec<Comment>) {
        self.config
            .lock()
            .unwrap()
            .comments
            .insert(item_id.to_string(), comments);
    }

    /// All side-effecting calls, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn liked(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::Like(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn followed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::Follow(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    /// `(content, parent_id)` of every reply
    pub fn replies(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::CreatePost {
                    content,
                    parent_id: Some(parent),
                } => Some((content, parent)),
                _ => None,
            })
            .collect()
    }

    /// Content of every top-level post
    pub fn posts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                MockCall::CreatePost {
                    content,
                    parent_id: None,
                } => Some(content),
                _ => None,
            })
            .collect()
    }

    /// Limits passed to each `fetch_feed` call
    pub fn feed_fetches(&self) -> Vec<usize> {
        self.feed_fetches.lock().unwrap().clone()
    }

    pub fn comment_lookups(&self) -> Vec<String> {
        self.comment_lookups.lock().unwrap().clone()
    }

    fn target_error(&self, target: &str) -> Option<RemoteError> {
        self.config
            .lock()
            .unwrap()
            .target_errors
            .get(target)
            .cloned()
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn fetch_feed(&self, limit: usize) -> Result<Vec<FeedItem>> {
        self.feed_fetches.lock().unwrap().push(limit);

        let config = self.config.lock().unwrap();
        if let Some(error) = &config.feed_error {
            return Err(error.clone().into());
        }
        Ok(config.feed.iter().take(limit).cloned().collect())
    }

    async fn like(&self, item_id: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(MockCall::Like(item_id.to_string()));

        match self.target_error(item_id) {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }

    async fn create_post(&self, content: &str, parent_id: Option<&str>) -> Result<CreatedPost> {
        self.calls.lock().unwrap().push(MockCall::CreatePost {
            content: content.to_string(),
            parent_id: parent_id.map(str::to_string),
        });

        if let Some(parent) = parent_id {
            if let Some(error) = self.target_error(parent) {
                return Err(error.into());
            }
        }
        if let Some(error) = self.config.lock().unwrap().post_error.clone() {
            return Err(error.into());
        }

        Ok(CreatedPost {
            id: format!("mock-{}", uuid::Uuid::new_v4()),
        })
    }

    async fn list_comments(&self, item_id: &str) -> Result<Vec<Comment>> {
        self.comment_lookups
            .lock()
            .unwrap()
            .push(item_id.to_string());

        Ok(self
            .config
            .lock()
            .unwrap()
            .comments
            .get(item_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn follow(&self, username: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(MockCall::Follow(username.to_string()));

        match self.target_error(username) {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }

    async fn user_info(&self, username: &str) -> Result<UserInfo> {
        if let Some(error) = self.target_error(username) {
            return Err(error.into());
        }
        Ok(UserInfo {
            username: username.to_string(),
            display_name: None,
            follower_count: Some(0),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_serves_feed_up_to_limit() {
        let platform = MockPlatform::with_feed(
            (0..5).map(|i| FeedItem::new(i.to_string(), "x")).collect(),
        );

        let feed = platform.fetch_feed(3).await.unwrap();

        assert_eq!(feed.len(), 3);
        assert_eq!(feed[0].id, "0");
        assert_eq!(platform.feed_fetches(), vec![3]);
    }

    #[tokio::test]
    async fn test_mock_records_calls_in_order() {
        let platform = MockPlatform::default();

        platform.like("p1").await.unwrap();
        platform.follow("alice").await.unwrap();
        platform.create_post("hello", None).await.unwrap();
        platform.create_post("thanks", Some("p1")).await.unwrap();

        assert_eq!(platform.liked(), vec!["p1"]);
        assert_eq!(platform.followed(), vec!["alice"]);
        assert_eq!(platform.posts(), vec!["hello"]);
        assert_eq!(
            platform.replies(),
            vec![("thanks".to_string(), "p1".to_string())]
        );
        assert_eq!(platform.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_mock_target_failure() {
        let platform = MockPlatform::default();
        platform.fail_target("p2", RemoteError::NotFound("gone".to_string()));

        assert!(platform.like("p1").await.is_ok());
        let err = platform.like("p2").await.unwrap_err();
        assert!(err.to_string().contains("gone"));
        assert_eq!(platform.liked(), vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn test_mock_clones_share_state() {
        let platform = MockPlatform::default();
        let handle = platform.clone();

        handle.like("p1").await.unwrap();
        assert_eq!(platform.liked(), vec!["p1"]);
    }

    #[tokio::test]
    async fn test_mock_feed_failure() {
        let platform = MockPlatform::default();
        platform.fail_feed(RemoteError::Transport("down".to_string()));

        assert!(platform.fetch_feed(10).await.is_err());
    }
}
