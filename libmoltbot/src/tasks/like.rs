//! Like (upvote) recent feed items

use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{debug, info};

use super::{settle, TaskContext, TaskPolicy, TaskReport};
use crate::config::LikeConfig;
use crate::error::Result;
use crate::types::{ActionKind, FeedItem};

pub struct LikeTask {
    config: LikeConfig,
}

impl LikeTask {
    pub fn new(config: LikeConfig) -> Self {
        Self { config }
    }

    /// Items not yet liked, by us or per the feed, in feed order
    fn candidates(&self, ctx: &TaskContext<'_>, feed: Vec<FeedItem>) -> Vec<FeedItem> {
        let mut picked = HashSet::new();
        feed.into_iter()
            .filter(|item| !item.liked && !ctx.dedup.seen(ActionKind::Like, &item.id))
            .filter(|item| picked.insert(item.id.clone()))
            .take(self.config.max_per_run)
            .collect()
    }
}

#[async_trait]
impl TaskPolicy for LikeTask {
    fn kind(&self) -> ActionKind {
        ActionKind::Like
    }

    fn max_actions_per_run(&self) -> usize {
        self.config.max_per_run
    }

    async fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskReport> {
        let mut report = TaskReport::new(ActionKind::Like);
        let feed = ctx.platform.fetch_feed(self.config.feed_size).await?;
        let candidates = self.candidates(ctx, feed);
        debug!("{} like candidate(s)", candidates.len());

        for (index, item) in candidates.iter().enumerate() {
            if index > 0 {
                let delay = self.config.jitter().sample(&mut *ctx.rng);
                ctx.sleeper.sleep(delay).await;
            }

            info!(kind = %ActionKind::Like, target = %item.id, "Liking: {}...", item.preview());
            let outcome = ctx.platform.like(&item.id).await;
            settle(ctx, &mut report, &item.id, true, outcome)?;
        }

        Ok(report)
    }
}
