//! Per-action task policies
//!
//! Each policy performs one kind of action (like, follow, reply, post) per
//! invocation. Policies hold only their configuration; everything they mutate
//! is borrowed from the scheduler through a [`TaskContext`].
//!
//! Failure handling while acting on individual targets:
//!
//! - validation / not-found: the target is skipped, the policy continues
//! - authentication: returned immediately, the run ends
//! - anything else: returned, the scheduler aborts the task for this tick

use async_trait::async_trait;
use rand::rngs::StdRng;
use tracing::{info, warn};

use crate::dedup::DedupStore;
use crate::error::Result;
use crate::pacing::Sleeper;
use crate::platforms::Platform;
use crate::stats::Stats;
use crate::types::ActionKind;

pub mod follow;
pub mod like;
pub mod post;
pub mod reply;

pub use follow::FollowTask;
pub use like::LikeTask;
pub use post::PostTask;
pub use reply::ReplyTask;

/// Everything a policy may read or mutate during one invocation
pub struct TaskContext<'a> {
    pub platform: &'a dyn Platform,
    pub dedup: &'a mut dyn DedupStore,
    pub stats: &'a mut Stats,
    pub sleeper: &'a dyn Sleeper,
    pub rng: &'a mut StdRng,
    pub agent_name: &'a str,
}

/// Outcome of one policy invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub kind: ActionKind,
    /// Remote side-effecting calls issued
    pub attempted: usize,
    pub succeeded: usize,
    /// Targets skipped after a validation or not-found response
    pub skipped: usize,
}

impl TaskReport {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            attempted: 0,
            succeeded: 0,
            skipped: 0,
        }
    }
}

/// A periodic action against the remote service
#[async_trait]
pub trait TaskPolicy: Send + Sync {
    fn kind(&self) -> ActionKind;

    /// Upper bound on side-effecting calls per invocation
    fn max_actions_per_run(&self) -> usize;

    async fn run(&self, ctx: &mut TaskContext<'_>) -> Result<TaskReport>;
}

/// Record the outcome of one action attempt
///
/// On success the target is recorded in the dedup store (when `dedup` is set)
/// and the stats are incremented. Skippable failures are logged and counted;
/// every other failure is returned to the caller.
pub(crate) fn settle(
    ctx: &mut TaskContext<'_>,
    report: &mut TaskReport,
    target: &str,
    dedup: bool,
    outcome: Result<()>,
) -> Result<()> {
    report.attempted += 1;
    match outcome {
        Ok(()) => {
            if dedup {
                ctx.dedup.record(report.kind, target);
            }
            ctx.stats.increment(report.kind);
            report.succeeded += 1;
            info!(kind = %report.kind, target = %target, "Action succeeded");
            Ok(())
        }
        Err(e) if e.is_skippable() => {
            report.skipped += 1;
            warn!(kind = %report.kind, target = %target, "Action skipped: {}", e);
            Ok(())
        }
        Err(e) => {
            warn!(kind = %report.kind, target = %target, "Action failed: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::dedup::MemoryDedupStore;
    use crate::pacing::RecordingSleeper;
    use crate::platforms::mock::MockPlatform;
    use crate::types::FeedItem;
    use rand::SeedableRng;

    pub(crate) const AGENT: &str = "TestBot";

    /// Owns everything a policy borrows, like the scheduler does
    pub(crate) struct Harness {
        pub platform: MockPlatform,
        pub dedup: MemoryDedupStore,
        pub stats: Stats,
        pub sleeper: RecordingSleeper,
        pub rng: StdRng,
    }

    impl Harness {
        pub fn new(feed: Vec<FeedItem>) -> Self {
            Self {
                platform: MockPlatform::with_feed(feed),
                dedup: MemoryDedupStore::new(),
                stats: Stats::new(),
                sleeper: RecordingSleeper::new(),
                rng: StdRng::seed_from_u64(42),
            }
        }

        pub async fn run(&mut self, task: &dyn TaskPolicy) -> Result<TaskReport> {
            let mut ctx = TaskContext {
                platform: &self.platform,
                dedup: &mut self.dedup,
                stats: &mut self.stats,
                sleeper: &self.sleeper,
                rng: &mut self.rng,
                agent_name: AGENT,
            };
            task.run(&mut ctx).await
        }
    }

    /// `count` items `p0..`, authored round-robin by `authors`
    pub(crate) fn feed(count: usize, authors: &[&str]) -> Vec<FeedItem> {
        (0..count)
            .map(|i| {
                let item = FeedItem::new(format!("p{}", i), format!("post number {}", i));
                if authors.is_empty() {
                    item
                } else {
                    item.by(authors[i % authors.len()])
                }
            })
            .collect()
    }
}
