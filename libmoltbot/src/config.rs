//! Configuration management for Moltbot
//!
//! Configuration is a TOML file. Every field has a default, and a missing file
//! at the default location yields the defaults, which leave every task
//! disabled.
//!
//! ```toml
//! [api]
//! base_url = "https://www.moltbook.com/api/v1"
//! timeout_seconds = 10
//! max_retries = 3
//! backoff_base_ms = 1000
//!
//! [scheduler]
//! poll_interval_seconds = 5
//!
//! [auto_like]
//! enabled = true
//! interval_seconds = 60
//! max_per_run = 5
//!
//! [auto_reply]
//! enabled = true
//! keywords = ["AI", "rust"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::pacing::JitterRange;
use crate::platforms::moltbook::DEFAULT_BASE_URL;
use crate::requester::RetryPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub scheduler: SchedulerConfig,
    pub auto_like: LikeConfig,
    pub auto_follow: FollowConfig,
    pub auto_reply: ReplyConfig,
    pub auto_post: PostConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 10,
            max_retries: 3,
            backoff_base_ms: 1000,
        }
    }
}

impl ApiConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.backoff_base_ms),
            timeout: Duration::from_secs(self.timeout_seconds),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    pub poll_interval_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LikeConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
    pub max_per_run: usize,
    pub feed_size: usize,
    pub jitter_min_seconds: f64,
    pub jitter_max_seconds: f64,
}

impl Default for LikeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_seconds: 60,
            max_per_run: 5,
            feed_size: 10,
            jitter_min_seconds: 1.0,
            jitter_max_seconds: 3.0,
        }
    }
}

impl LikeConfig {
    pub fn jitter(&self) -> JitterRange {
        JitterRange::new(self.jitter_min_seconds, self.jitter_max_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FollowConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
    pub max_per_run: usize,
    pub feed_size: usize,
    pub jitter_min_seconds: f64,
    pub jitter_max_seconds: f64,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_seconds: 120,
            max_per_run: 2,
            feed_size: 20,
            jitter_min_seconds: 2.0,
            jitter_max_seconds: 5.0,
        }
    }
}

impl FollowConfig {
    pub fn jitter(&self) -> JitterRange {
        JitterRange::new(self.jitter_min_seconds, self.jitter_max_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReplyConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
    pub keywords: Vec<String>,
    pub feed_size: usize,
    pub templates: Vec<String>,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_seconds: 300,
            keywords: Vec::new(),
            feed_size: 10,
            templates: default_reply_templates(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PostConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
    /// Templates may use `{time}` and `{agent}` placeholders
    pub templates: Vec<String>,
    pub hashtags: Vec<String>,
    pub hashtag_count: usize,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_seconds: 3600,
            templates: default_post_templates(),
            hashtags: default_hashtags(),
            hashtag_count: 2,
        }
    }
}

fn default_reply_templates() -> Vec<String> {
    vec![
        "Thanks for sharing! Anyone interested in this topic, let's discuss 🙏".to_string(),
        "Great point, this is worth a closer look.".to_string(),
        "Interesting take! Following this thread.".to_string(),
        "感谢分享！🙏 对这个话题感兴趣的朋友可以一起讨论".to_string(),
    ]
}

fn default_post_templates() -> Vec<String> {
    vec![
        "🤖 {agent} check-in at {time}. Autoposter is running fine!".to_string(),
        "{time}: another day, another experiment from {agent}.".to_string(),
        "Status report from {agent} ({time}): all systems nominal.".to_string(),
    ]
}

fn default_hashtags() -> Vec<String> {
    ["#AI", "#automation", "#agents", "#rust", "#bots", "#moltbook"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Config {
    /// Load configuration
    ///
    /// An explicit `path` must exist. Without one, `MOLTBOT_CONFIG` is used if
    /// set, else the XDG location; a missing file there yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (config_path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match std::env::var("MOLTBOT_CONFIG") {
                Ok(p) => (expand_path(&p), true),
                Err(_) => (resolve_config_path()?, false),
            },
        };

        if !explicit && !config_path.exists() {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the scheduler cannot run with
    pub fn validate(&self) -> Result<()> {
        positive("scheduler.poll_interval_seconds", self.scheduler.poll_interval_seconds)?;
        positive("api.timeout_seconds", self.api.timeout_seconds)?;
        if self.api.base_url.trim().is_empty() {
            return Err(invalid("api.base_url", "must not be empty"));
        }

        positive("auto_like.interval_seconds", self.auto_like.interval_seconds)?;
        positive("auto_like.feed_size", self.auto_like.feed_size as u64)?;
        jitter_range(
            "auto_like",
            self.auto_like.jitter_min_seconds,
            self.auto_like.jitter_max_seconds,
        )?;

        positive("auto_follow.interval_seconds", self.auto_follow.interval_seconds)?;
        positive("auto_follow.feed_size", self.auto_follow.feed_size as u64)?;
        jitter_range(
            "auto_follow",
            self.auto_follow.jitter_min_seconds,
            self.auto_follow.jitter_max_seconds,
        )?;

        positive("auto_reply.interval_seconds", self.auto_reply.interval_seconds)?;
        positive("auto_reply.feed_size", self.auto_reply.feed_size as u64)?;
        if self.auto_reply.enabled && self.auto_reply.templates.is_empty() {
            return Err(invalid("auto_reply.templates", "must not be empty"));
        }

        positive("auto_post.interval_seconds", self.auto_post.interval_seconds)?;
        if self.auto_post.enabled && self.auto_post.templates.is_empty() {
            return Err(invalid("auto_post.templates", "must not be empty"));
        }
        if self.auto_post.hashtag_count > self.auto_post.hashtags.len() {
            return Err(invalid(
                "auto_post.hashtag_count",
                &format!(
                    "is {} but only {} hashtags are configured",
                    self.auto_post.hashtag_count,
                    self.auto_post.hashtags.len()
                ),
            ));
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler.poll_interval_seconds)
    }
}

fn invalid(field: &str, reason: &str) -> crate::error::BotError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

fn positive(field: &str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(invalid(field, "must be greater than zero"));
    }
    Ok(())
}

fn jitter_range(section: &str, min: f64, max: f64) -> Result<()> {
    if !min.is_finite() || !max.is_finite() || min < 0.0 {
        return Err(invalid(
            &format!("{}.jitter_min_seconds", section),
            "must be a non-negative number",
        ));
    }
    if min > max {
        return Err(invalid(
            &format!("{}.jitter_max_seconds", section),
            "must not be smaller than jitter_min_seconds",
        ));
    }
    Ok(())
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("moltbot").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults_disable_every_task() {
        let config = Config::default();

        assert!(!config.auto_like.enabled);
        assert!(!config.auto_follow.enabled);
        assert!(!config.auto_reply.enabled);
        assert!(!config.auto_post.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();

        assert_eq!(config.auto_like.interval_seconds, 60);
        assert_eq!(config.auto_like.max_per_run, 5);
        assert_eq!(config.auto_like.feed_size, 10);
        assert_eq!(config.auto_follow.interval_seconds, 120);
        assert_eq!(config.auto_follow.max_per_run, 2);
        assert_eq!(config.auto_follow.feed_size, 20);
        assert_eq!(config.auto_post.hashtag_count, 2);
        assert_eq!(config.scheduler.poll_interval_seconds, 5);
        assert_eq!(config.api.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
[auto_like]
enabled = true
max_per_run = 3

[auto_reply]
enabled = true
keywords = ["AI", "rust"]
"#,
        );

        let config = Config::load_from_path(&path).unwrap();

        assert!(config.auto_like.enabled);
        assert_eq!(config.auto_like.max_per_run, 3);
        assert_eq!(config.auto_like.interval_seconds, 60);
        assert_eq!(config.auto_reply.keywords, vec!["AI", "rust"]);
        assert!(!config.auto_reply.templates.is_empty());
        assert!(!config.auto_post.enabled);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[auto_follow]\ninterval_seconds = 0\n");

        let err = Config::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("auto_follow.interval_seconds"));
    }

    #[test]
    fn test_inverted_jitter_is_rejected() {
        let mut config = Config::default();
        config.auto_like.jitter_min_seconds = 4.0;
        config.auto_like.jitter_max_seconds = 1.0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_too_many_hashtags_is_rejected() {
        let mut config = Config::default();
        config.auto_post.hashtags = vec!["#one".to_string()];
        config.auto_post.hashtag_count = 2;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("hashtag_count"));
    }

    #[test]
    fn test_enabled_post_needs_templates() {
        let mut config = Config::default();
        config.auto_post.enabled = true;
        config.auto_post.templates.clear();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "invalid toml content [[[");

        let err = Config::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");

        assert!(Config::load(Some(&missing)).is_err());
    }

    #[test]
    #[serial]
    fn test_env_override() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[scheduler]\npoll_interval_seconds = 9\n");

        std::env::set_var("MOLTBOT_CONFIG", &path);
        let config = Config::load(None);
        std::env::remove_var("MOLTBOT_CONFIG");

        assert_eq!(config.unwrap().scheduler.poll_interval_seconds, 9);
    }

    #[test]
    #[serial]
    fn test_env_override_missing_file_is_error() {
        std::env::set_var("MOLTBOT_CONFIG", "/nonexistent/moltbot/config.toml");
        let config = Config::load(None);
        std::env::remove_var("MOLTBOT_CONFIG");

        assert!(config.is_err());
    }
}
