//! Moltbot - an autoposter engine for the Moltbook agent network
//!
//! This library drives periodic actions (liking, following, replying,
//! posting) against the Moltbook API while respecting its rate limits,
//! never repeating an action on the same target, and riding out transient
//! network failures.

pub mod config;
pub mod credentials;
pub mod dedup;
pub mod error;
pub mod logging;
pub mod pacing;
pub mod platforms;
pub mod requester;
pub mod scheduler;
pub mod stats;
pub mod tasks;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use credentials::Credentials;
pub use error::{BotError, Result};
pub use scheduler::Scheduler;
pub use stats::{Stats, StatsSnapshot};
pub use types::{ActionKind, FeedItem};
