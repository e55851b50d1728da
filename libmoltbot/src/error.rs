//! Error types for Moltbot

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BotError>;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl BotError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            BotError::InvalidInput(_) => 3,
            BotError::Remote(RemoteError::Authentication(_)) => 2,
            BotError::Remote(_) => 1,
            BotError::Config(_) => 1,
        }
    }

    /// Errors that end the whole run rather than a single task or action
    pub fn is_fatal(&self) -> bool {
        matches!(self, BotError::Remote(RemoteError::Authentication(_)))
    }

    /// Errors that only invalidate the one action that produced them
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            BotError::Remote(RemoteError::Validation(_)) | BotError::Remote(RemoteError::NotFound(_))
        )
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to parse credentials: {0}")]
    CredentialsParse(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

/// Failures reported by the remote service or the transport in front of it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        retry_after_secs: Option<u64>,
    },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Request rejected: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Unexpected response: {0}")]
    Unexpected(String),

    #[error("Cancelled before retry")]
    Cancelled,
}

impl RemoteError {
    /// Build the error matching an HTTP status code
    ///
    /// Returns `None` for success statuses.
    pub fn from_status(status: u16, body: &str, retry_after_secs: Option<u64>) -> Option<Self> {
        let detail = if body.trim().is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {}: {}", status, truncate(body, 200))
        };

        match status {
            200..=299 => None,
            401 | 403 => Some(RemoteError::Authentication(detail)),
            404 => Some(RemoteError::NotFound(detail)),
            400 | 409 | 422 => Some(RemoteError::Validation(detail)),
            429 => Some(RemoteError::RateLimit {
                message: detail,
                retry_after_secs,
            }),
            500..=599 => Some(RemoteError::Server(detail)),
            _ => Some(RemoteError::Unexpected(detail)),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
