//! Tick loop driving the task policies
//!
//! The scheduler owns all mutable state (dedup store, stats, RNG) and lends it
//! to one policy at a time. Tasks always run in the fixed order like, follow,
//! reply, post, and never concurrently.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::dedup::{DedupStore, MemoryDedupStore};
use crate::error::{BotError, RemoteError, Result};
use crate::pacing::{Shutdown, Sleeper, TokioSleeper};
use crate::platforms::Platform;
use crate::stats::{Stats, StatsSnapshot};
use crate::tasks::{
    FollowTask, LikeTask, PostTask, ReplyTask, TaskContext, TaskPolicy, TaskReport,
};
use crate::types::ActionKind;

const POLL_SLICE: Duration = Duration::from_secs(1);

/// A policy plus its scheduling state
pub struct ScheduledTask {
    policy: Box<dyn TaskPolicy>,
    enabled: bool,
    interval: Duration,
    last_run_at: DateTime<Utc>,
}

impl ScheduledTask {
    pub fn kind(&self) -> ActionKind {
        self.policy.kind()
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_run_at(&self) -> DateTime<Utc> {
        self.last_run_at
    }

    /// Due once `interval` has elapsed since the last run
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match now.signed_duration_since(self.last_run_at).to_std() {
            Ok(elapsed) => elapsed >= self.interval,
            // now is before last_run_at (clock went backwards)
            Err(_) => false,
        }
    }
}

pub struct Scheduler {
    platform: Arc<dyn Platform>,
    dedup: Box<dyn DedupStore>,
    stats: Stats,
    sleeper: Arc<dyn Sleeper>,
    rng: StdRng,
    agent_name: String,
    poll_interval: Duration,
    shutdown: Shutdown,
    started_at: DateTime<Utc>,
    tasks: Vec<ScheduledTask>,
}

impl Scheduler {
    /// Create a scheduler with no tasks
    ///
    /// Defaults: in-memory dedup store, real sleeps, entropy-seeded RNG,
    /// 5 second poll interval, start time now.
    pub fn new(platform: Arc<dyn Platform>, agent_name: impl Into<String>) -> Self {
        Self {
            platform,
            dedup: Box::new(MemoryDedupStore::new()),
            stats: Stats::new(),
            sleeper: Arc::new(TokioSleeper),
            rng: StdRng::from_entropy(),
            agent_name: agent_name.into(),
            poll_interval: Duration::from_secs(5),
            shutdown: Shutdown::new(),
            started_at: Utc::now(),
            tasks: Vec::new(),
        }
    }

    /// Create a scheduler with all four tasks configured from `config`
    pub fn from_config(
        config: &Config,
        platform: Arc<dyn Platform>,
        agent_name: impl Into<String>,
    ) -> Self {
        Self::new(platform, agent_name)
            .with_poll_interval(config.poll_interval())
            .with_task(
                Box::new(LikeTask::new(config.auto_like.clone())),
                config.auto_like.enabled,
                Duration::from_secs(config.auto_like.interval_seconds),
            )
            .with_task(
                Box::new(FollowTask::new(config.auto_follow.clone())),
                config.auto_follow.enabled,
                Duration::from_secs(config.auto_follow.interval_seconds),
            )
            .with_task(
                Box::new(ReplyTask::new(config.auto_reply.clone())),
                config.auto_reply.enabled,
                Duration::from_secs(config.auto_reply.interval_seconds),
            )
            .with_task(
                Box::new(PostTask::new(config.auto_post.clone())),
                config.auto_post.enabled,
                Duration::from_secs(config.auto_post.interval_seconds),
            )
    }

    /// Register a task, replacing any task of the same kind
    ///
    /// Its last run time starts at the scheduler's start time.
    pub fn with_task(
        mut self,
        policy: Box<dyn TaskPolicy>,
        enabled: bool,
        interval: Duration,
    ) -> Self {
        let kind = policy.kind();
        self.tasks.retain(|t| t.kind() != kind);
        self.tasks.push(ScheduledTask {
            policy,
            enabled,
            interval,
            last_run_at: self.started_at,
        });
        self.tasks.sort_by_key(|t| t.kind());
        self
    }

    pub fn with_dedup(mut self, dedup: Box<dyn DedupStore>) -> Self {
        self.dedup = dedup;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Move the start time, and with it the last run time of every task
    pub fn with_start_time(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        for task in &mut self.tasks {
            task.last_run_at = started_at;
        }
        self
    }

    pub fn tasks(&self) -> &[ScheduledTask] {
        &self.tasks
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn dedup(&self) -> &dyn DedupStore {
        &*self.dedup
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Run every enabled task once, ignoring intervals
    pub async fn run_once(&mut self) -> Result<StatsSnapshot> {
        info!("Running every enabled task once");
        self.run_tasks(Utc::now(), true).await?;
        Ok(self.stats.snapshot())
    }

    /// Run every enabled task that is due at `now`
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Result<Vec<TaskReport>> {
        self.run_tasks(now, false).await
    }

    /// Tick every poll interval until shutdown is requested
    ///
    /// Returns the final stats, or the first fatal error.
    pub async fn run_forever(&mut self) -> Result<StatsSnapshot> {
        info!(
            "Scheduler started with {} enabled task(s), polling every {}",
            self.tasks.iter().filter(|t| t.enabled).count(),
            humantime::format_duration(self.poll_interval)
        );

        while !self.shutdown.is_triggered() {
            self.tick(Utc::now()).await?;
            self.idle().await;
        }

        info!("Shutdown requested, stopping scheduler loop");
        Ok(self.stats.snapshot())
    }

    /// Sleep one poll interval in short slices, returning early on shutdown
    async fn idle(&self) {
        let mut remaining = self.poll_interval;
        while !remaining.is_zero() && !self.shutdown.is_triggered() {
            let slice = remaining.min(POLL_SLICE);
            self.sleeper.sleep(slice).await;
            remaining -= slice;
        }
    }

    async fn run_tasks(&mut self, now: DateTime<Utc>, force: bool) -> Result<Vec<TaskReport>> {
        let Self {
            platform,
            dedup,
            stats,
            sleeper,
            rng,
            agent_name,
            shutdown,
            tasks,
            ..
        } = self;

        let mut reports = Vec::new();
        for task in tasks.iter_mut() {
            if !task.enabled || !(force || task.is_due(now)) {
                continue;
            }
            if shutdown.is_triggered() {
                debug!("Shutdown requested, skipping remaining tasks");
                break;
            }

            let kind = task.kind();
            debug!(kind = %kind, "Running task");
            let mut ctx = TaskContext {
                platform: &**platform,
                dedup: &mut **dedup,
                stats: &mut *stats,
                sleeper: &**sleeper,
                rng: &mut *rng,
                agent_name: agent_name.as_str(),
            };

            match task.policy.run(&mut ctx).await {
                Ok(report) => {
                    info!(
                        kind = %kind,
                        attempted = report.attempted,
                        succeeded = report.succeeded,
                        skipped = report.skipped,
                        "Task finished"
                    );
                    reports.push(report);
                }
                Err(e) if e.is_fatal() => {
                    error!(kind = %kind, "Fatal error, stopping: {}", e);
                    return Err(e);
                }
                Err(BotError::Remote(RemoteError::Cancelled)) => {
                    info!(kind = %kind, "Task cancelled by shutdown");
                    break;
                }
                Err(e) => {
                    warn!(kind = %kind, "Task aborted for this tick: {}", e);
                }
            }
            task.last_run_at = now;
        }

        Ok(reports)
    }
}
