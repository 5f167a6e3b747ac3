use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Tuning for watch subscriptions and the long-poll loop
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WatchConfig {
    /// Deadline for the synchronous fetch performed at registration
    /// Default: 5000
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Server-side wait of one blocking query in seconds
    /// Default: 300
    #[serde(default = "default_wait_time_secs")]
    pub wait_time_secs: u64,

    /// First backoff after a failed poll
    /// Default: 100
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Backoff ceiling for consecutive failed polls
    /// Default: 10000
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    /// Per-watcher channel buffer of the in-memory store
    /// Default: 16
    #[serde(default = "default_watcher_buffer_size")]
    pub watcher_buffer_size: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: default_fetch_timeout_ms(),
            wait_time_secs: default_wait_time_secs(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            watcher_buffer_size: default_watcher_buffer_size(),
        }
    }
}

impl WatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fetch_timeout_ms == 0 {
            return Err(Error::InvalidConfig("watch.fetch_timeout_ms must be greater than 0".into()));
        }
        if self.wait_time_secs == 0 {
            return Err(Error::InvalidConfig("watch.wait_time_secs must be greater than 0".into()));
        }
        if self.retry_base_delay_ms > self.retry_max_delay_ms {
            return Err(Error::InvalidConfig(format!(
                "watch.retry_base_delay_ms ({}) exceeds watch.retry_max_delay_ms ({})",
                self.retry_base_delay_ms, self.retry_max_delay_ms
            )));
        }
        if self.watcher_buffer_size == 0 {
            return Err(Error::InvalidConfig("watch.watcher_buffer_size must be greater than 0".into()));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn wait_time(&self) -> Duration {
        Duration::from_secs(self.wait_time_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }
}

fn default_fetch_timeout_ms() -> u64 {
    5000
}
fn default_wait_time_secs() -> u64 {
    300
}
fn default_retry_base_delay_ms() -> u64 {
    100
}
fn default_retry_max_delay_ms() -> u64 {
    10000
}
fn default_watcher_buffer_size() -> usize {
    16
}
