//! Logging setup shared by the Moltbot binaries
//!
//! All log output goes to stderr so stdout stays free for the stats report.
//! Three formats are supported:
//! - `text`: plain lines, no colors (default)
//! - `json`: one JSON object per line, each action carrying `kind` and
//!   `target` fields
//! - `pretty`: multi-line with colors, for development
//!
//! # Examples
//!
//! ```no_run
//! use libmoltbot::logging::{LogFormat, LoggingConfig};
//!
//! // Explicit settings
//! LoggingConfig::new(LogFormat::Json, "info".to_string(), false).init()?;
//!
//! // Or resolve from MOLTBOT_LOG_FORMAT / MOLTBOT_LOG_LEVEL
//! LoggingConfig::from_env(None, false).init()?;
//! # Ok::<(), libmoltbot::BotError>(())
//! ```

use std::str::FromStr;
use tracing_subscriber::EnvFilter;

use crate::error::{BotError, Result};

pub const FORMAT_ENV: &str = "MOLTBOT_LOG_FORMAT";
pub const LEVEL_ENV: &str = "MOLTBOT_LOG_LEVEL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable text output (no colors, for piping)
    #[default]
    Text,
    /// Machine-parseable JSON (one JSON object per line)
    Json,
    /// Pretty-printed with colors (for development)
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!(
                "Invalid log format: '{}'. Valid options: text, json, pretty",
                s
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
            LogFormat::Pretty => write!(f, "pretty"),
        }
    }
}

/// Configuration for logging initialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
    pub verbose: bool,
}

impl LoggingConfig {
    /// Create a new logging configuration
    ///
    /// # Arguments
    ///
    /// * `format` - Log output format (text, json, or pretty)
    /// * `level` - Filter directive, e.g. `info` or `libmoltbot=debug,warn`
    /// * `verbose` - If true, the level becomes `debug`
    pub fn new(format: LogFormat, level: String, verbose: bool) -> Self {
        Self {
            format,
            level,
            verbose,
        }
    }

    /// Resolve settings from the environment
    ///
    /// `format` wins over `MOLTBOT_LOG_FORMAT`; an unparseable value in the
    /// environment falls back to text. The level comes from
    /// `MOLTBOT_LOG_LEVEL`, defaulting to `info`.
    pub fn from_env(format: Option<LogFormat>, verbose: bool) -> Self {
        let format = format
            .or_else(|| {
                std::env::var(FORMAT_ENV)
                    .ok()
                    .and_then(|s| s.parse().ok())
            })
            .unwrap_or_default();
        let level = std::env::var(LEVEL_ENV).unwrap_or_else(|_| "info".to_string());

        Self::new(format, level, verbose)
    }

    /// The filter directive actually applied
    pub fn directive(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            &self.level
        }
    }

    /// Install the global subscriber
    ///
    /// Call once at program start. Fails if the level directive does not
    /// parse (and `RUST_LOG` is unset) or a subscriber is already installed.
    pub fn init(&self) -> Result<()> {
        // RUST_LOG, when set and valid, wins over everything else
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(self.directive()).map_err(|e| {
                BotError::InvalidInput(format!("Invalid log level '{}': {}", self.directive(), e))
            })?,
        };

        let installed = match self.format {
            LogFormat::Json => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .flatten_event(true)
                .with_target(true)
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .try_init(),
            LogFormat::Text => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .try_init(),
        };

        installed.map_err(|e| BotError::InvalidInput(format!("Logging setup failed: {}", e)))
    }
}
