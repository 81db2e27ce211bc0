//! Configuration for the chat host.

use crate::error::ChatError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Host configuration, loaded from a TOML file when present. The API
/// key is never part of the file; it comes from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Upper bound on tool-dispatch rounds within a single turn.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_model() -> String {
    "claude-3-5-sonnet-20241022".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_max_tool_rounds() -> usize {
    10
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            base_url: default_base_url(),
            max_tool_rounds: default_max_tool_rounds(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ChatConfig {
    /// Load from a config file if it exists, otherwise use defaults.
    pub fn load(path: &Path) -> Result<Self, ChatError> {
        if !path.exists() {
            tracing::info!("configuration file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| ChatError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| ChatError::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Read the API key from `ANTHROPIC_API_KEY`.
    pub fn api_key_from_env() -> Result<String, ChatError> {
        std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| ChatError::Config("ANTHROPIC_API_KEY is not set".to_string()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ChatConfig::default();
        assert_eq!(config.max_tokens, 1000);
        assert_eq!(config.max_tool_rounds, 10);
        assert_eq!(config.base_url, "https://api.anthropic.com");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ChatConfig = toml::from_str("model = \"claude-3-opus-20240229\"").unwrap();
        assert_eq!(config.model, "claude-3-opus-20240229");
        assert_eq!(config.max_tokens, 1000);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = ChatConfig::load(Path::new("/nonexistent/tally.toml")).unwrap();
        assert_eq!(config.model, default_model());
    }
}
