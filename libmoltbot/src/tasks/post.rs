//! Publish a new top-level post composed from templates

use async_trait::async_trait;
use chrono::{Local, NaiveTime};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use super::{settle, TaskContext, TaskPolicy, TaskReport};
use crate::config::PostConfig;
use crate::error::{BotError, Result};
use crate::types::ActionKind;

pub struct PostTask {
    config: PostConfig,
}

impl PostTask {
    pub fn new(config: PostConfig) -> Self {
        Self { config }
    }

    /// Build post content from a random template and random hashtags
    ///
    /// `{time}` becomes `HH:MM` of `time`, `{agent}` the agent name. The
    /// hashtags are distinct and appended after a blank line.
    pub fn compose<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        agent_name: &str,
        time: NaiveTime,
    ) -> Result<String> {
        let template = self
            .config
            .templates
            .choose(rng)
            .ok_or_else(|| BotError::InvalidInput("No post templates configured".to_string()))?;

        let mut content = template
            .replace("{time}", &time.format("%H:%M").to_string())
            .replace("{agent}", agent_name);

        let tags: Vec<&str> = self
            .config
            .hashtags
            .choose_multiple(rng, self.config.hashtag_count)
            .map(String::as_str)
            .collect();
        if !tags.is_empty() {
            content.push_str("\n\n");
            content.push_str(&tags.join(" "));
        }

        Ok(content)
    }
}

#[async_trait]
impl TaskPolicy for PostTask {
    fn kind(&self) -> ActionKind {
        ActionKind::Post
    }

    fn max_actions_per_run(&self) -> usize {
        1
    }

    async fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskReport> {
        let mut report = TaskReport::new(ActionKind::Post);
        let content = self.compose(&mut *ctx.rng, ctx.agent_name, Local::now().time())?;

        info!(kind = %ActionKind::Post, "Posting: {}", content.replace('\n', " "));
        let outcome = ctx
            .platform
            .create_post(&content, None)
            .await
            .map(|created| debug!("Post created with id {}", created.id));
        settle(ctx, &mut report, "new post", false, outcome)?;

        Ok(report)
    }
}
