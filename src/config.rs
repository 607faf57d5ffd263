// =============================================================================
// Client Configuration — endpoint, request and retry settings
// =============================================================================
//
// Every field carries a serde default, so an empty JSON object (or no file at
// all) gives the stock behaviour: USD symbols, 10 daily candles, 10 attempts
// per symbol with a 30 s pause that doubles after each failure.
// =============================================================================

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::BitfxError;
use crate::retry::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "https://api-pub.bitfinex.com/v2/";
pub const DEFAULT_CANDLE_LIMIT: u32 = 10;

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_candle_limit() -> u32 {
    DEFAULT_CANDLE_LIMIT
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    concat!("bitfx-request/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Settings for the client and the batch collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// REST API root, with trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Daily candles requested per symbol; also the averaging window in days.
    #[serde(default = "default_candle_limit")]
    pub candle_limit: u32,

    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Only list symbols quoted against USD.
    #[serde(default = "default_true")]
    pub usd_only: bool,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Backoff applied to unusable rate responses.
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            candle_limit: default_candle_limit(),
            request_timeout_secs: default_request_timeout_secs(),
            usd_only: true,
            user_agent: default_user_agent(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Load and validate configuration from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read client config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse client config from {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("invalid client config in {}", path.display()))?;

        info!(
            path = %path.display(),
            base_url = %config.base_url,
            candle_limit = config.candle_limit,
            max_attempts = config.retry.max_attempts,
            "client config loaded"
        );

        Ok(config)
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(BitfxError::config(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.candle_limit == 0 {
            return Err(BitfxError::config("candle_limit must be at least 1"));
        }
        if self.request_timeout_secs == 0 {
            return Err(BitfxError::config("request_timeout_secs must be at least 1"));
        }
        self.retry.validate()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
