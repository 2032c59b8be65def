//! Client configuration.
//!
//! `ClientConfig` can be built in code, deserialized from JSON, or read from
//! the environment (`GERRIT_URL`, `GERRIT_TIMEOUT_SECS`). Missing fields fall
//! back to their defaults.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Applied by the executor, never by the client itself. Must be at least 1.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn from_json(raw: &str) -> Result<Self, ApiError> {
        let config: ClientConfig =
            serde_json::from_str(raw).map_err(|e| ApiError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ApiError> {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("GERRIT_URL") {
            config.base_url = url;
        }
        if let Ok(secs) = std::env::var("GERRIT_TIMEOUT_SECS") {
            config.timeout_secs = secs.parse().map_err(|_| {
                ApiError::Config(format!("GERRIT_TIMEOUT_SECS is not a number: {secs}"))
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.normalized_base_url().is_empty() {
            return Err(ApiError::Config("base_url must not be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ApiError::Config("timeout_secs must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Base URL without trailing slashes.
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
