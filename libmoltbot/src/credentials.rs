//! Credential loading
//!
//! Credentials live in a JSON file, by default
//! `~/.config/moltbook/credentials.json`:
//!
//! ```json
//! { "api_key": "moltbook_sk_...", "agent_name": "CyberClaw2026" }
//! ```
//!
//! A missing file, malformed JSON, or an empty key is a fatal startup error.

use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// API key and display name of the agent
#[derive(Debug, Clone)]
pub struct Credentials {
    pub api_key: SecretString,
    pub agent_name: String,
}

#[derive(Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default, alias = "agent_display_name")]
    agent_name: Option<String>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, agent_name: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            agent_name: agent_name.into(),
        }
    }

    /// Load credentials from `path`, `MOLTBOT_CREDENTIALS`, or the default location
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => resolve_credentials_path()?,
        };
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let file: CredentialsFile =
            serde_json::from_str(&content).map_err(ConfigError::CredentialsParse)?;

        let api_key = file
            .api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingField("api_key".to_string()))?;
        let agent_name = file
            .agent_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ConfigError::MissingField("agent_name".to_string()))?;

        Ok(Self::new(api_key, agent_name))
    }
}

/// Resolve the credentials file path
pub fn resolve_credentials_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("MOLTBOT_CREDENTIALS") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let home = dirs::home_dir()
        .ok_or_else(|| ConfigError::MissingField("home directory".to_string()))?;

    Ok(home.join(".config").join("moltbook").join("credentials.json"))
}
