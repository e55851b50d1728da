//! Remote service abstraction and implementations
//!
//! Task policies talk to the content-sharing service only through the
//! [`Platform`] trait. [`moltbook::MoltbookClient`] implements it over the
//! rate-limited [`Requester`](crate::requester::Requester);
//! [`mock::MockPlatform`] implements it in memory for tests.
//!
//! # Examples
//!
//! ```no_run
//! use libmoltbot::platforms::{moltbook::MoltbookClient, Platform};
//! use libmoltbot::{Config, Credentials};
//! use libmoltbot::pacing::{Shutdown, TokioSleeper};
//! use std::sync::Arc;
//!
//! # async fn example() -> libmoltbot::Result<()> {
//! let config = Config::load(None)?;
//! let credentials = Credentials::load(None)?;
//! let client = MoltbookClient::from_config(
//!     &config.api,
//!     &credentials,
//!     Arc::new(TokioSleeper),
//!     Shutdown::new(),
//! )?;
//!
//! for item in client.fetch_feed(10).await? {
//!     println!("{}: {}", item.id, item.preview());
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Comment, CreatedPost, FeedItem, UserInfo};

pub mod moltbook;

// Mock platform is available for all builds (not just tests) to support integration tests
pub mod mock;

/// Operations the bot consumes from the remote service
///
/// Every method returns a typed error on failure; callers decide whether the
/// failure skips one action, aborts a task, or ends the run.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Fetch the newest `limit` items of the public feed, in feed order
    async fn fetch_feed(&self, limit: usize) -> Result<Vec<FeedItem>>;

    /// Like (upvote) an item
    async fn like(&self, item_id: &str) -> Result<()>;

    /// Create a post, or a reply when `parent_id` is given
    ///
    /// Never re-issued after an ambiguous response.
    async fn create_post(&self, content: &str, parent_id: Option<&str>) -> Result<CreatedPost>;

    /// Comments on an item
    async fn list_comments(&self, item_id: &str) -> Result<Vec<Comment>>;

    /// Follow a user
    async fn follow(&self, username: &str) -> Result<()>;

    /// Public profile of a user
    async fn user_info(&self, username: &str) -> Result<UserInfo>;

    /// Lowercase identifier for log lines
    fn name(&self) -> &str;
}
