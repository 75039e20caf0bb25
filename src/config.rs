//! Environment configuration

use crate::runtime::{PollConfig, DEFAULT_POLL_INTERVAL};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8001";

/// Connection and polling settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub api_url: String,
    pub token: Option<String>,
    pub poll: PollConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            poll: PollConfig::default(),
        }
    }
}

impl SyncConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unparseable values fall back
    /// to their defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_url = lookup("STUDYSYNC_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let token = lookup("STUDYSYNC_TOKEN").filter(|v| !v.is_empty());

        let interval = match lookup("STUDYSYNC_POLL_INTERVAL_MS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    tracing::warn!(value = %raw, "Invalid STUDYSYNC_POLL_INTERVAL_MS, using default");
                    DEFAULT_POLL_INTERVAL
                }
            },
            None => DEFAULT_POLL_INTERVAL,
        };

        let enabled = lookup("STUDYSYNC_POLLING").map_or(true, |v| {
            !matches!(v.trim().to_ascii_lowercase().as_str(), "off" | "false" | "0")
        });

        Self {
            api_url,
            token,
            poll: PollConfig { interval, enabled },
        }
    }
}
