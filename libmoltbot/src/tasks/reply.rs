//! Reply to uncommented feed items that mention a keyword
//!
//! At most one reply is issued per invocation.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use super::{settle, TaskContext, TaskPolicy, TaskReport};
use crate::config::ReplyConfig;
use crate::error::Result;
use crate::types::{ActionKind, FeedItem};

pub struct ReplyTask {
    config: ReplyConfig,
    keywords: Vec<String>,
}

impl ReplyTask {
    pub fn new(config: ReplyConfig) -> Self {
        let keywords = config
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { config, keywords }
    }

    fn mentions_keyword(&self, item: &FeedItem) -> bool {
        let content = item.content.to_lowercase();
        self.keywords.iter().any(|k| content.contains(k.as_str()))
    }

    /// Whether the item has no comments yet, asking the platform when the
    /// feed did not say
    async fn is_uncommented(&self, ctx: &TaskContext<'_>, item: &FeedItem) -> Result<bool> {
        if let Some(count) = item.comment_count {
            return Ok(count == 0);
        }
        match ctx.platform.list_comments(&item.id).await {
            Ok(comments) => Ok(comments.is_empty()),
            Err(e) if e.is_skippable() => {
                debug!(target_id = %item.id, "Comment lookup skipped: {}", e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn first_candidate(
        &self,
        ctx: &TaskContext<'_>,
        feed: Vec<FeedItem>,
    ) -> Result<Option<FeedItem>> {
        for item in feed {
            if !self.mentions_keyword(&item) || ctx.dedup.seen(ActionKind::Reply, &item.id) {
                continue;
            }
            if self.is_uncommented(ctx, &item).await? {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl TaskPolicy for ReplyTask {
    fn kind(&self) -> ActionKind {
        ActionKind::Reply
    }

    fn max_actions_per_run(&self) -> usize {
        1
    }

    async fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskReport> {
        let mut report = TaskReport::new(ActionKind::Reply);
        if self.keywords.is_empty() {
            debug!("No reply keywords configured");
            return Ok(report);
        }

        let feed = ctx.platform.fetch_feed(self.config.feed_size).await?;
        let Some(item) = self.first_candidate(ctx, feed).await? else {
            debug!("No item to reply to");
            return Ok(report);
        };

        let Some(template) = self.config.templates.choose(&mut *ctx.rng) else {
            warn!("No reply templates configured");
            return Ok(report);
        };

        info!(kind = %ActionKind::Reply, target = %item.id, "Replying to: {}...", item.preview());
        let outcome = ctx
            .platform
            .create_post(template, Some(&item.id))
            .await
            .map(|created| debug!("Reply created with id {}", created.id));
        settle(ctx, &mut report, &item.id, true, outcome)?;

        Ok(report)
    }
}
