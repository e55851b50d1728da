//! Follow authors that show up in the feed

use async_trait::async_trait;
use tracing::{debug, info};

use super::{settle, TaskContext, TaskPolicy, TaskReport};
use crate::config::FollowConfig;
use crate::error::Result;
use crate::types::{ActionKind, FeedItem};

pub struct FollowTask {
    config: FollowConfig,
}

impl FollowTask {
    pub fn new(config: FollowConfig) -> Self {
        Self { config }
    }

    /// Distinct authors in first-seen order, minus the agent itself and
    /// anyone already followed
    fn candidates(&self, ctx: &TaskContext<'_>, feed: &[FeedItem]) -> Vec<String> {
        let mut authors: Vec<String> = Vec::new();
        for username in feed.iter().filter_map(|item| item.author_username.as_deref()) {
            let username = username.trim();
            if username.is_empty()
                || username.eq_ignore_ascii_case(ctx.agent_name)
                || ctx.dedup.seen(ActionKind::Follow, username)
                || authors.iter().any(|a| a == username)
            {
                continue;
            }
            authors.push(username.to_string());
            if authors.len() == self.config.max_per_run {
                break;
            }
        }
        authors
    }
}

#[async_trait]
impl TaskPolicy for FollowTask {
    fn kind(&self) -> ActionKind {
        ActionKind::Follow
    }

    fn max_actions_per_run(&self) -> usize {
        self.config.max_per_run
    }

    async fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskReport> {
        let mut report = TaskReport::new(ActionKind::Follow);
        if self.config.max_per_run == 0 {
            return Ok(report);
        }

        let feed = ctx.platform.fetch_feed(self.config.feed_size).await?;
        let authors = self.candidates(ctx, &feed);
        debug!("{} follow candidate(s)", authors.len());

        for (index, username) in authors.iter().enumerate() {
            if index > 0 {
                let delay = self.config.jitter().sample(&mut *ctx.rng);
                ctx.sleeper.sleep(delay).await;
            }

            info!(kind = %ActionKind::Follow, target = %username, "Following @{}", username);
            let outcome = ctx.platform.follow(username).await;
            settle(ctx, &mut report, username, true, outcome)?;
        }

        Ok(report)
    }
}
