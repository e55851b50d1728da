//! Core types for Moltbot

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of side-effecting action the bot performs
///
/// The declaration order is the fixed execution order of the scheduler.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Like,
    Follow,
    Reply,
    Post,
}

impl ActionKind {
    /// All kinds in execution order
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Like,
        ActionKind::Follow,
        ActionKind::Reply,
        ActionKind::Post,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Follow => "follow",
            Self::Reply => "reply",
            Self::Post => "post",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single item of the remote feed
///
/// Snapshot taken at fetch time; never updated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub id: String,
    pub content: String,
    pub author_username: Option<String>,
    /// `None` when the feed did not report a count
    pub comment_count: Option<u32>,
    pub liked: bool,
}

impl FeedItem {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            author_username: None,
            comment_count: Some(0),
            liked: false,
        }
    }

    pub fn by(mut self, author: impl Into<String>) -> Self {
        self.author_username = Some(author.into());
        self
    }

    pub fn with_comments(mut self, count: u32) -> Self {
        self.comment_count = Some(count);
        self
    }

    pub fn without_comment_count(mut self) -> Self {
        self.comment_count = None;
        self
    }

    pub fn already_liked(mut self) -> Self {
        self.liked = true;
        self
    }

    /// Short preview of the content for log lines
    pub fn preview(&self) -> String {
        self.content.chars().take(30).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub author_username: Option<String>,
}

/// Identifier of content created by the bot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPost {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub username: String,
    pub display_name: Option<String>,
    pub follower_count: Option<u64>,
}

// ============================================================================
// Wire Types
// ============================================================================

/// Post ids arrive as strings or numbers depending on the endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireId {
    Text(String),
    Number(i64),
}

impl WireId {
    pub(crate) fn into_string(self) -> String {
        match self {
            WireId::Text(s) => s,
            WireId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct WireAuthor {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WirePost {
    #[serde(default)]
    pub id: Option<WireId>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Option<WireAuthor>,
    #[serde(default, alias = "comments_count")]
    pub comment_count: Option<u32>,
    #[serde(default)]
    pub liked: bool,
}

impl WirePost {
    /// Convert into a feed item, dropping posts without an id
    pub(crate) fn into_feed_item(self) -> Option<FeedItem> {
        let id = self.id?.into_string();
        if id.is_empty() {
            return None;
        }
        Some(FeedItem {
            id,
            content: self.content.unwrap_or_default(),
            author_username: self
                .author
                .and_then(|a| a.username)
                .filter(|u| !u.is_empty()),
            comment_count: self.comment_count,
            liked: self.liked,
        })
    }

    pub(crate) fn into_comment(self) -> Option<Comment> {
        let id = self.id?.into_string();
        Some(Comment {
            id,
            content: self.content.unwrap_or_default(),
            author_username: self.author.and_then(|a| a.username),
        })
    }
}
